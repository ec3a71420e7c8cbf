//! Record normalizer
//!
//! Turns raw shipment rows into `NormalizedShipment`s. Each cleaning step is a
//! separate function returning new data, applied in this order:
//!
//! 1. drop rows whose three event dates are all missing
//! 2. derive delay, fulfillment time and the late flag
//! 3. coerce amounts and fill gaps with the column median
//! 4. drop rows without a vendor

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{
    NormalizedShipment, ShipmentRecord, COL_DELIVERED, COL_FREIGHT, COL_LINE_VALUE, COL_PO_SENT,
    COL_SCHEDULED, COL_VENDOR, REQUIRED_COLUMNS,
};

/// Cell contents treated as missing, after trimming
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "null", "NULL", "None", "none",
];

/// Date-only formats, two-digit years before four-digit ones so that
/// `2-Jun-06` is not read as year 6
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %b %y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Normalize a header: trim, lowercase, spaces and slashes to underscores,
/// parentheses removed. `"Freight Cost (USD)"` becomes `"freight_cost_usd"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('/', "_")
        .replace(['(', ')'], "")
}

/// Trimmed cell text, or `None` for empty cells and missing-value markers
pub fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build shipment records from a header row and data rows with arbitrary
/// header noise. Fails if any canonical column is absent after normalization.
pub fn records_from_table(headers: &StringRecord, rows: &[StringRecord]) -> Result<Vec<ShipmentRecord>> {
    let normalized: Vec<String> = headers.iter().map(normalize_column_name).collect();
    info!("Normalized columns: {:?}", normalized);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !normalized.iter().any(|h| h == col))
        .collect();
    if !missing.is_empty() {
        warn!("Missing required columns: {:?}", missing);
        return Err(PipelineError::SchemaMismatch {
            expected: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: normalized,
        });
    }

    // First match wins when a normalized name occurs twice
    let index = |col: &str| normalized.iter().position(|h| h == col);
    let vendor = index(COL_VENDOR);
    let po_sent = index(COL_PO_SENT);
    let scheduled = index(COL_SCHEDULED);
    let delivered = index(COL_DELIVERED);
    let freight = index(COL_FREIGHT);
    let line_value = index(COL_LINE_VALUE);

    let cell = |row: &StringRecord, idx: Option<usize>| {
        idx.and_then(|i| row.get(i)).and_then(clean_cell)
    };
    // vendors group by exact text, so surrounding whitespace is kept
    let raw_cell = |row: &StringRecord, idx: Option<usize>| {
        idx.and_then(|i| row.get(i))
            .filter(|raw| clean_cell(raw).is_some())
            .map(str::to_string)
    };

    Ok(rows
        .iter()
        .map(|row| ShipmentRecord {
            vendor: raw_cell(row, vendor),
            po_sent_to_vendor_date: cell(row, po_sent),
            scheduled_delivery_date: cell(row, scheduled),
            delivered_to_client_date: cell(row, delivered),
            freight_cost_usd: cell(row, freight),
            line_item_value: cell(row, line_value),
        })
        .collect())
}

/// Best-effort timestamp parsing; date-only values fall at midnight.
/// Anything unrecognized is `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|dt| dt.date())
}

/// Whole days from `from` to `to`, floored: 2 hours across midnight is 0,
/// 2 hours backwards is -1
pub fn days_between(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Option<i64> {
    Some((to? - from?).num_seconds().div_euclid(86_400))
}

/// Parse a currency amount. Thousands separators and a leading `$` are
/// stripped; negative, non-finite and non-numeric text is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().trim_start_matches('$').chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Median of the present values (mean of the two middle values for even counts)
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Result of filling a numeric column's gaps
#[derive(Debug, Clone, PartialEq)]
pub struct Imputed {
    pub values: Vec<f64>,
    pub fill_value: f64,
    pub filled: usize,
}

/// Replace missing values with the column median. A column with no value at
/// all has no median; its gaps are filled with 0.0.
pub fn impute_median(values: &[Option<f64>]) -> Imputed {
    let fill_value = median(values).unwrap_or(0.0);
    let filled = values.iter().filter(|v| v.is_none()).count();
    Imputed {
        values: values.iter().map(|v| v.unwrap_or(fill_value)).collect(),
        fill_value,
        filled,
    }
}

/// Row counts observed while normalizing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub unparsed_dates: usize,
    pub dropped_no_dates: usize,
    pub unparsed_amounts: usize,
    pub imputed_freight: usize,
    pub imputed_line_value: usize,
    pub dropped_no_vendor: usize,
    pub output_rows: usize,
}

#[derive(Debug)]
pub struct NormalizeOutput {
    pub shipments: Vec<NormalizedShipment>,
    pub stats: NormalizeStats,
}

/// Record with parsed dates, not yet filtered
#[derive(Debug, Clone)]
struct DatedRecord {
    vendor: Option<String>,
    po_sent: Option<NaiveDateTime>,
    scheduled: Option<NaiveDateTime>,
    delivered: Option<NaiveDateTime>,
    freight: Option<String>,
    line_value: Option<String>,
}

impl DatedRecord {
    fn has_any_date(&self) -> bool {
        self.po_sent.is_some() || self.scheduled.is_some() || self.delivered.is_some()
    }
}

/// Record with derived timing and coerced amounts
#[derive(Debug, Clone)]
struct TimedRecord {
    vendor: Option<String>,
    delivery_delay_days: Option<i64>,
    fulfillment_time_days: Option<i64>,
    late_flag: u8,
    freight: Option<f64>,
    line_value: Option<f64>,
}

fn parse_dates(records: Vec<ShipmentRecord>, stats: &mut NormalizeStats) -> Vec<DatedRecord> {
    let mut parse = |raw: Option<String>| -> Option<NaiveDateTime> {
        let raw = raw?;
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            stats.unparsed_dates += 1;
        }
        parsed
    };

    records
        .into_iter()
        .map(|r| DatedRecord {
            po_sent: parse(r.po_sent_to_vendor_date),
            scheduled: parse(r.scheduled_delivery_date),
            delivered: parse(r.delivered_to_client_date),
            vendor: r.vendor,
            freight: r.freight_cost_usd,
            line_value: r.line_item_value,
        })
        .collect()
}

fn drop_undated(records: Vec<DatedRecord>) -> (Vec<DatedRecord>, usize) {
    let before = records.len();
    let kept: Vec<DatedRecord> = records.into_iter().filter(DatedRecord::has_any_date).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn derive_timing(records: Vec<DatedRecord>, stats: &mut NormalizeStats) -> Vec<TimedRecord> {
    let mut coerce = |raw: Option<String>| -> Option<f64> {
        let raw = raw?;
        let parsed = parse_amount(&raw);
        if parsed.is_none() {
            stats.unparsed_amounts += 1;
        }
        parsed
    };

    records
        .into_iter()
        .map(|r| {
            let delay = days_between(r.scheduled, r.delivered);
            TimedRecord {
                delivery_delay_days: delay,
                fulfillment_time_days: days_between(r.po_sent, r.delivered),
                late_flag: u8::from(delay.is_some_and(|d| d > 0)),
                freight: coerce(r.freight),
                line_value: coerce(r.line_value),
                vendor: r.vendor,
            }
        })
        .collect()
}

fn fill_amounts(records: Vec<TimedRecord>, stats: &mut NormalizeStats) -> Vec<TimedRecord> {
    let freight = impute_median(&records.iter().map(|r| r.freight).collect::<Vec<_>>());
    let line_value = impute_median(&records.iter().map(|r| r.line_value).collect::<Vec<_>>());

    stats.imputed_freight = freight.filled;
    stats.imputed_line_value = line_value.filled;
    debug!(
        "Median fill values: freight={:.2}, line_item_value={:.2}",
        freight.fill_value, line_value.fill_value
    );

    records
        .into_iter()
        .zip(freight.values)
        .zip(line_value.values)
        .map(|((r, f), v)| TimedRecord {
            freight: Some(f),
            line_value: Some(v),
            ..r
        })
        .collect()
}

fn drop_unidentified(records: Vec<TimedRecord>) -> (Vec<NormalizedShipment>, usize) {
    let before = records.len();
    let kept: Vec<NormalizedShipment> = records
        .into_iter()
        .filter_map(|r| {
            Some(NormalizedShipment {
                vendor: r.vendor?,
                delivery_delay_days: r.delivery_delay_days,
                fulfillment_time_days: r.fulfillment_time_days,
                late_flag: r.late_flag,
                freight_cost: r.freight.unwrap_or_default(),
                line_item_value: r.line_value.unwrap_or_default(),
            })
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Run the full normalization over raw records. Never fails: malformed
/// values become nulls and unusable rows are counted and dropped.
pub fn normalize(records: Vec<ShipmentRecord>) -> NormalizeOutput {
    let mut stats = NormalizeStats {
        input_rows: records.len(),
        ..Default::default()
    };

    let dated = parse_dates(records, &mut stats);
    let (dated, dropped_no_dates) = drop_undated(dated);
    stats.dropped_no_dates = dropped_no_dates;

    let timed = derive_timing(dated, &mut stats);
    let filled = fill_amounts(timed, &mut stats);

    let (shipments, dropped_no_vendor) = drop_unidentified(filled);
    stats.dropped_no_vendor = dropped_no_vendor;
    stats.output_rows = shipments.len();

    if stats.dropped_no_dates > 0 {
        warn!("Dropped {} rows with no parseable event date", stats.dropped_no_dates);
    }
    if stats.dropped_no_vendor > 0 {
        warn!("Dropped {} rows with no vendor", stats.dropped_no_vendor);
    }
    info!(
        "Normalized {} of {} rows ({} unparsed dates, {} unparsed amounts)",
        stats.output_rows, stats.input_rows, stats.unparsed_dates, stats.unparsed_amounts
    );

    NormalizeOutput { shipments, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        vendor: Option<&str>,
        po: Option<&str>,
        scheduled: Option<&str>,
        delivered: Option<&str>,
        freight: Option<&str>,
        value: Option<&str>,
    ) -> ShipmentRecord {
        ShipmentRecord {
            vendor: vendor.map(String::from),
            po_sent_to_vendor_date: po.map(String::from),
            scheduled_delivery_date: scheduled.map(String::from),
            delivered_to_client_date: delivered.map(String::from),
            freight_cost_usd: freight.map(String::from),
            line_item_value: value.map(String::from),
        }
    }

    #[test]
    fn test_column_names() {
        assert_eq!(normalize_column_name(" Freight Cost (USD) "), "freight_cost_usd");
        assert_eq!(normalize_column_name("PO Sent to Vendor Date"), "po_sent_to_vendor_date");
        assert_eq!(normalize_column_name("Line Item Value"), "line_item_value");
        assert_eq!(normalize_column_name("Weight/Volume"), "weight_volume");
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2006, 6, 2).unwrap();
        assert_eq!(parse_date("2-Jun-06"), Some(expected));
        assert_eq!(parse_date("02-Jun-2006"), Some(expected));
        assert_eq!(parse_date("2006-06-02"), Some(expected));
        assert_eq!(parse_date("6/2/2006"), Some(expected));
        assert_eq!(parse_date("2006-06-02 14:30:00"), Some(expected));
        assert_eq!(parse_date("2006-06-02T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_date("Date Not Captured"), None);
        assert_eq!(parse_date("Pre-PQ Process"), None);
    }

    #[test]
    fn test_day_difference_is_floored() {
        let late_night = parse_timestamp("2024-01-10 23:00:00");
        let early_morning = parse_timestamp("2024-01-11 01:00:00");
        assert_eq!(days_between(late_night, early_morning), Some(0));
        assert_eq!(days_between(early_morning, late_night), Some(-1));
        assert_eq!(days_between(parse_timestamp("2024-01-10"), parse_timestamp("2024-01-13 06:00")), Some(3));

        let out = normalize(vec![record(
            Some("A"),
            Some("2024-01-01 08:00:00"),
            Some("2024-01-10 23:00:00"),
            Some("2024-01-11 01:00:00"),
            Some("10"),
            Some("100"),
        )]);
        assert_eq!(out.shipments[0].delivery_delay_days, Some(0));
        assert_eq!(out.shipments[0].late_flag, 0);
        assert_eq!(out.shipments[0].fulfillment_time_days, Some(9));
    }

    #[test]
    fn test_amounts() {
        assert_eq!(parse_amount("1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("$12,000"), Some(12000.0));
        assert_eq!(parse_amount("Freight Included in Commodity Cost"), None);
        assert_eq!(parse_amount("See ASN-93 (ID#:1281)"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_median_imputation() {
        let imputed = impute_median(&[Some(1.0), None, Some(5.0), Some(3.0), None]);
        assert_eq!(imputed.fill_value, 3.0);
        assert_eq!(imputed.filled, 2);
        assert_eq!(imputed.values, vec![1.0, 3.0, 5.0, 3.0, 3.0]);

        assert_eq!(median(&[Some(1.0), Some(2.0), Some(10.0), Some(4.0)]), Some(3.0));
        assert_eq!(impute_median(&[None, None]).values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_schema_mismatch() {
        let headers = StringRecord::from(vec!["Vendor", "Scheduled Delivery Date"]);
        let err = records_from_table(&headers, &[]).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { expected, found } => {
                assert_eq!(expected.len(), 6);
                assert_eq!(found, vec!["vendor", "scheduled_delivery_date"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_records_from_noisy_headers() {
        let headers = StringRecord::from(vec![
            "ID",
            " Vendor ",
            "PO Sent to Vendor Date",
            "Scheduled Delivery Date",
            "Delivered to Client Date",
            "Freight Cost (USD)",
            "LINE ITEM VALUE",
        ]);
        let rows = vec![StringRecord::from(vec![
            "1", "Acme", "1-Jun-06", "5-Jun-06", "7-Jun-06", "1,000", "N/A",
        ])];
        let records = records_from_table(&headers, &rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vendor.as_deref(), Some("Acme"));
        assert_eq!(records[0].freight_cost_usd.as_deref(), Some("1,000"));
        assert_eq!(records[0].line_item_value, None);
    }

    #[test]
    fn test_vendor_whitespace_is_significant() {
        let headers = StringRecord::from(vec![
            "Vendor",
            "PO Sent to Vendor Date",
            "Scheduled Delivery Date",
            "Delivered to Client Date",
            "Freight Cost (USD)",
            "Line Item Value",
        ]);
        let rows = vec![
            StringRecord::from(vec!["Acme", "1-Jun-06", "5-Jun-06", "5-Jun-06", "10", "100"]),
            StringRecord::from(vec!["Acme ", "1-Jun-06", "5-Jun-06", "9-Jun-06", "10", "100"]),
            StringRecord::from(vec!["  ", "1-Jun-06", "5-Jun-06", "5-Jun-06", "10", "100"]),
        ];
        let records = records_from_table(&headers, &rows).unwrap();
        assert_eq!(records[1].vendor.as_deref(), Some("Acme "));
        assert_eq!(records[2].vendor, None);

        let out = normalize(records);
        assert_eq!(out.stats.dropped_no_vendor, 1);
        let suppliers = crate::aggregate::aggregate_suppliers(&out.shipments);
        let vendors: Vec<&str> = suppliers.iter().map(|s| s.vendor.as_str()).collect();
        assert_eq!(vendors, ["Acme", "Acme "]);
        assert_eq!(suppliers[0].kpis.late_delivery_rate, 0.0);
        assert_eq!(suppliers[1].kpis.late_delivery_rate, 1.0);
    }

    #[test]
    fn test_timing_and_late_flag() {
        let out = normalize(vec![
            record(Some("A"), Some("2024-01-01"), Some("2024-01-10"), Some("2024-01-13"), Some("10"), Some("100")),
            record(Some("A"), Some("2024-01-01"), Some("2024-01-10"), Some("2024-01-08"), Some("10"), Some("100")),
            record(Some("A"), None, Some("2024-01-10"), None, Some("10"), Some("100")),
        ]);
        let s = &out.shipments;
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].delivery_delay_days, Some(3));
        assert_eq!(s[0].fulfillment_time_days, Some(12));
        assert_eq!(s[0].late_flag, 1);
        assert_eq!(s[1].delivery_delay_days, Some(-2));
        assert_eq!(s[1].late_flag, 0);
        assert_eq!(s[2].delivery_delay_days, None);
        assert_eq!(s[2].fulfillment_time_days, None);
        assert_eq!(s[2].late_flag, 0);
    }

    #[test]
    fn test_missing_po_date_gives_null_fulfillment() {
        let out = normalize(vec![record(
            Some("A"),
            Some("Date Not Captured"),
            Some("2024-01-10"),
            Some("2024-01-11"),
            Some("10"),
            Some("100"),
        )]);
        assert_eq!(out.shipments[0].fulfillment_time_days, None);
        assert_eq!(out.shipments[0].delivery_delay_days, Some(1));
        assert_eq!(out.stats.unparsed_dates, 1);
    }

    #[test]
    fn test_filters_and_median_scope() {
        let out = normalize(vec![
            // no dates at all: dropped before the median is computed
            record(Some("A"), None, Some("Date Not Captured"), None, Some("1000000"), Some("5")),
            // no vendor: still contributes to the median
            record(None, Some("2024-01-01"), None, None, Some("30"), Some("5")),
            record(Some("B"), Some("2024-01-01"), None, None, Some("10"), Some("5")),
            record(Some("C"), Some("2024-01-01"), None, None, Some("Freight Included in Commodity Cost"), Some("5")),
        ]);
        assert_eq!(out.stats.input_rows, 4);
        assert_eq!(out.stats.dropped_no_dates, 1);
        assert_eq!(out.stats.dropped_no_vendor, 1);
        assert_eq!(out.stats.imputed_freight, 1);
        assert_eq!(out.stats.output_rows, 2);

        let c = out.shipments.iter().find(|s| s.vendor == "C").unwrap();
        assert_eq!(c.freight_cost, 20.0);
    }
}
