use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Canonical (header-normalized) column names of the raw shipment file
pub const COL_VENDOR: &str = "vendor";
pub const COL_PO_SENT: &str = "po_sent_to_vendor_date";
pub const COL_SCHEDULED: &str = "scheduled_delivery_date";
pub const COL_DELIVERED: &str = "delivered_to_client_date";
pub const COL_FREIGHT: &str = "freight_cost_usd";
pub const COL_LINE_VALUE: &str = "line_item_value";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_VENDOR,
    COL_PO_SENT,
    COL_SCHEDULED,
    COL_DELIVERED,
    COL_FREIGHT,
    COL_LINE_VALUE,
];

/// Model input features, in training-matrix column order
pub const FEATURE_NAMES: [&str; 5] = [
    "avg_delivery_delay_days",
    "avg_fulfillment_time_days",
    "late_delivery_rate",
    "avg_freight_cost",
    "avg_order_value",
];

/// Raw record from CSV ingestion, one per shipment line item.
/// Every field is the trimmed cell text, `None` when the cell is empty or a
/// missing-value marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentRecord {
    pub vendor: Option<String>,
    pub po_sent_to_vendor_date: Option<String>,
    pub scheduled_delivery_date: Option<String>,
    pub delivered_to_client_date: Option<String>,
    pub freight_cost_usd: Option<String>,
    pub line_item_value: Option<String>,
}

/// Shipment after date parsing, coercion and imputation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedShipment {
    pub vendor: String,
    pub delivery_delay_days: Option<i64>,
    pub fulfillment_time_days: Option<i64>,
    pub late_flag: u8,
    pub freight_cost: f64,
    pub line_item_value: f64,
}

/// Supplier risk category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Low, RiskLabel::Medium, RiskLabel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RiskLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Low" => Ok(RiskLabel::Low),
            "Medium" => Ok(RiskLabel::Medium),
            "High" => Ok(RiskLabel::High),
            other => Err(PipelineError::UnknownLabel(other.to_string())),
        }
    }
}

/// The five supplier KPIs shared by every risk classifier.
///
/// The two date-derived averages are `None` when a supplier has no shipment
/// with both dates needed to compute them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiVector {
    pub avg_delivery_delay_days: Option<f64>,
    pub avg_fulfillment_time_days: Option<f64>,
    pub late_delivery_rate: f64,
    pub avg_freight_cost: f64,
    pub avg_order_value: f64,
}

impl KpiVector {
    /// Feature values in `FEATURE_NAMES` order
    pub fn values(&self) -> [Option<f64>; 5] {
        [
            self.avg_delivery_delay_days,
            self.avg_fulfillment_time_days,
            Some(self.late_delivery_rate),
            Some(self.avg_freight_cost),
            Some(self.avg_order_value),
        ]
    }
}

/// Per-supplier aggregate before labeling
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierMetrics {
    pub vendor: String,
    pub shipments: usize,
    pub kpis: KpiVector,
}

/// One row of the supplier feature file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierFeature {
    pub vendor: String,
    pub avg_delivery_delay_days: Option<f64>,
    pub avg_fulfillment_time_days: Option<f64>,
    pub late_delivery_rate: f64,
    pub avg_freight_cost: f64,
    pub avg_order_value: f64,
    pub risk_label: RiskLabel,
}

impl SupplierFeature {
    pub fn new(vendor: impl Into<String>, kpis: KpiVector, risk_label: RiskLabel) -> Self {
        Self {
            vendor: vendor.into(),
            avg_delivery_delay_days: kpis.avg_delivery_delay_days,
            avg_fulfillment_time_days: kpis.avg_fulfillment_time_days,
            late_delivery_rate: kpis.late_delivery_rate,
            avg_freight_cost: kpis.avg_freight_cost,
            avg_order_value: kpis.avg_order_value,
            risk_label,
        }
    }

    pub fn kpis(&self) -> KpiVector {
        KpiVector {
            avg_delivery_delay_days: self.avg_delivery_delay_days,
            avg_fulfillment_time_days: self.avg_fulfillment_time_days,
            late_delivery_rate: self.late_delivery_rate,
            avg_freight_cost: self.avg_freight_cost,
            avg_order_value: self.avg_order_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        for label in RiskLabel::ALL {
            assert_eq!(label.as_str().parse::<RiskLabel>().unwrap(), label);
        }
        assert!("Critical".parse::<RiskLabel>().is_err());
    }

    #[test]
    fn test_feature_kpis_roundtrip() {
        let kpis = KpiVector {
            avg_delivery_delay_days: Some(1.5),
            avg_fulfillment_time_days: None,
            late_delivery_rate: 0.2,
            avg_freight_cost: 300.0,
            avg_order_value: 9000.0,
        };
        let feature = SupplierFeature::new("Acme", kpis, RiskLabel::Low);
        assert_eq!(feature.kpis(), kpis);
        assert_eq!(kpis.values()[1], None);
        assert_eq!(kpis.values()[2], Some(0.2));
    }
}
