//! Synthetic procurement data for demos and tests
//!
//! Each supplier gets a reliability tier that drives how often and how badly
//! its deliveries slip. Rows are written with the messy conventions seen in
//! real procurement exports: `dd-Mon-yy` dates mixed with ISO dates,
//! placeholder text in date and freight columns, thousands separators and
//! the occasional missing vendor.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use serde::Serialize;

const VENDOR_PREFIXES: &[&str] = &[
    "Aurora", "Baltic", "Cedar", "Delta", "Evergreen", "Falcon", "Granite", "Harbor", "Ionic", "Juniper",
    "Keystone", "Lumen", "Meridian", "Northwind", "Orchid", "Pioneer", "Quantum", "Redwood", "Summit", "Titan",
];

const VENDOR_SUFFIXES: &[&str] = &[
    "Pharma Ltd",
    "Medical Supplies",
    "Diagnostics Inc.",
    "Logistics GmbH",
    "Healthcare Pvt. Ltd",
    "Trading Co.",
];

const COUNTRIES: &[&str] = &["Nigeria", "Zambia", "Vietnam", "Haiti", "Kenya", "Uganda", "South Africa"];
const SHIPMENT_MODES: &[&str] = &["Air", "Truck", "Air Charter", "Ocean"];
const DATE_PLACEHOLDERS: &[&str] = &["Date Not Captured", "Pre-PQ Process"];

/// Raw output row; headers follow the procurement export layout
#[derive(Debug, Clone, Serialize)]
pub struct RawShipmentRow {
    #[serde(rename = "ID")]
    pub id: usize,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Shipment Mode")]
    pub shipment_mode: String,
    #[serde(rename = "PO Sent to Vendor Date")]
    pub po_sent_to_vendor_date: String,
    #[serde(rename = "Scheduled Delivery Date")]
    pub scheduled_delivery_date: String,
    #[serde(rename = "Delivered to Client Date")]
    pub delivered_to_client_date: String,
    #[serde(rename = "Freight Cost (USD)")]
    pub freight_cost_usd: String,
    #[serde(rename = "Line Item Value")]
    pub line_item_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityTier {
    Reliable,
    Shaky,
    Poor,
}

#[derive(Debug, Clone)]
pub struct SupplierProfile {
    pub name: String,
    pub tier: ReliabilityTier,
    pub late_probability: f64,
    pub max_slip_days: i64,
    pub lead_time_days: i64,
    pub freight_base: f64,
    pub order_value_base: f64,
}

#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub suppliers: usize,
    pub min_shipments: usize,
    pub max_shipments: usize,
    /// Probability that any single date cell is missing or a placeholder
    pub missing_rate: f64,
    /// Probability that a freight cell holds text instead of a number
    pub freight_text_rate: f64,
    /// Probability that the vendor cell is blank
    pub blank_vendor_rate: f64,
    pub start: NaiveDate,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            suppliers: 40,
            min_shipments: 5,
            max_shipments: 60,
            missing_rate: 0.05,
            freight_text_rate: 0.1,
            blank_vendor_rate: 0.01,
            start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Insert thousands separators: 12345.5 -> "12,345.50"
pub fn format_amount(value: f64) -> String {
    let text = format!("{:.2}", value);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    format!("{}.{}", grouped, frac_part)
}

fn format_date(date: NaiveDate, rng: &mut impl Rng) -> String {
    if rng.gen_bool(0.8) {
        date.format("%-d-%b-%y").to_string()
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}

fn maybe_date(date: NaiveDate, missing_rate: f64, rng: &mut impl Rng) -> String {
    if rng.gen::<f64>() >= missing_rate {
        return format_date(date, rng);
    }
    if rng.gen_bool(0.5) {
        String::new()
    } else {
        DATE_PLACEHOLDERS.choose(rng).copied().unwrap_or_default().to_string()
    }
}

fn freight_text(rng: &mut impl Rng) -> String {
    match rng.gen_range(0..3) {
        0 => "Freight Included in Commodity Cost".to_string(),
        1 => "Invoiced Separately".to_string(),
        _ => format!("See ASN-{} (ID#:{})", rng.gen_range(1..999), rng.gen_range(1..99999)),
    }
}

/// Draw a supplier with a random reliability tier
pub fn generate_profile(name: String, rng: &mut impl Rng) -> SupplierProfile {
    let roll: f64 = rng.gen();
    let (tier, late_probability, max_slip_days) = if roll < 0.5 {
        (ReliabilityTier::Reliable, rng.gen_range(0.0..0.2), rng.gen_range(1..=3))
    } else if roll < 0.8 {
        (ReliabilityTier::Shaky, rng.gen_range(0.25..0.45), rng.gen_range(2..=6))
    } else {
        (ReliabilityTier::Poor, rng.gen_range(0.5..0.85), rng.gen_range(5..=20))
    };

    SupplierProfile {
        name,
        tier,
        late_probability,
        max_slip_days,
        lead_time_days: rng.gen_range(10..=90),
        freight_base: rng.gen_range(200.0..8000.0),
        order_value_base: rng.gen_range(1000.0..250_000.0),
    }
}

/// Distinct vendor names, prefix x suffix combinations
pub fn vendor_names(count: usize, rng: &mut impl Rng) -> Vec<String> {
    let mut names: Vec<String> = VENDOR_PREFIXES
        .iter()
        .flat_map(|p| VENDOR_SUFFIXES.iter().map(move |s| format!("{} {}", p, s)))
        .collect();
    names.shuffle(rng);
    if count > names.len() {
        let extra: Vec<String> = (names.len()..count).map(|i| format!("Vendor {:04}", i)).collect();
        names.extend(extra);
    }
    names.truncate(count);
    names
}

fn generate_shipment(
    id: usize,
    profile: &SupplierProfile,
    params: &SyntheticParams,
    rng: &mut impl Rng,
) -> RawShipmentRow {
    let po_sent = params.start + Duration::days(rng.gen_range(0..730));
    let scheduled = po_sent + Duration::days(profile.lead_time_days + rng.gen_range(-5..=5));
    let slip = if rng.gen::<f64>() < profile.late_probability {
        rng.gen_range(1..=profile.max_slip_days)
    } else {
        -rng.gen_range(0..=4)
    };
    let delivered = scheduled + Duration::days(slip);

    let vendor = if rng.gen::<f64>() < params.blank_vendor_rate {
        String::new()
    } else {
        profile.name.clone()
    };

    let freight = if rng.gen::<f64>() < params.freight_text_rate {
        freight_text(rng)
    } else {
        format_amount(profile.freight_base * rng.gen_range(0.5..1.5))
    };

    RawShipmentRow {
        id,
        country: COUNTRIES.choose(rng).copied().unwrap_or_default().to_string(),
        vendor,
        shipment_mode: SHIPMENT_MODES.choose(rng).copied().unwrap_or_default().to_string(),
        po_sent_to_vendor_date: maybe_date(po_sent, params.missing_rate, rng),
        scheduled_delivery_date: maybe_date(scheduled, params.missing_rate, rng),
        delivered_to_client_date: maybe_date(delivered, params.missing_rate, rng),
        freight_cost_usd: freight,
        line_item_value: format_amount(profile.order_value_base * rng.gen_range(0.2..2.0)),
    }
}

/// Generate supplier profiles and their shipments
pub fn generate(params: &SyntheticParams, rng: &mut impl Rng) -> (Vec<SupplierProfile>, Vec<RawShipmentRow>) {
    let profiles: Vec<SupplierProfile> = vendor_names(params.suppliers, rng)
        .into_iter()
        .map(|name| generate_profile(name, rng))
        .collect();

    let mut rows = Vec::new();
    for profile in &profiles {
        let count = rng.gen_range(params.min_shipments..=params.max_shipments.max(params.min_shipments));
        for _ in 0..count {
            let id = rows.len() + 1;
            rows.push(generate_shipment(id, profile, params, rng));
        }
    }
    rows.shuffle(rng);
    (profiles, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{parse_amount, parse_date};
    use rand::rngs::StdRng;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(parse_amount(&format_amount(98765.4)), Some(98765.4));
    }

    #[test]
    fn test_dates_parse_back() {
        let mut rng = StdRng::seed_from_u64(42);
        let date = NaiveDate::from_ymd_opt(2015, 3, 7).unwrap();
        for _ in 0..20 {
            assert_eq!(parse_date(&format_date(date, &mut rng)), Some(date));
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let params = SyntheticParams { suppliers: 5, ..SyntheticParams::default() };
        let (_, a) = generate(&params, &mut StdRng::seed_from_u64(9));
        let (_, b) = generate(&params, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.vendor == y.vendor && x.freight_cost_usd == y.freight_cost_usd));
    }

    #[test]
    fn test_vendor_names_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let names = vendor_names(150, &mut rng);
        assert_eq!(names.len(), 150);
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 150);
    }
}
