//! Business-rule risk labeling
//!
//! Rules are evaluated in precedence order and the first match wins:
//!
//! | Label  | Condition                                        |
//! |--------|--------------------------------------------------|
//! | High   | late_delivery_rate > 0.5 OR avg delay > 5 days   |
//! | Medium | late_delivery_rate > 0.25 OR avg delay > 2 days  |
//! | Low    | otherwise                                        |
//!
//! A supplier that meets both the High and the Medium thresholds is High.
//! A missing average delay never satisfies a delay threshold.

use tracing::info;

use crate::models::{KpiVector, RiskLabel, SupplierFeature, SupplierMetrics};

pub const HIGH_LATE_RATE: f64 = 0.5;
pub const HIGH_DELAY_DAYS: f64 = 5.0;
pub const MEDIUM_LATE_RATE: f64 = 0.25;
pub const MEDIUM_DELAY_DAYS: f64 = 2.0;

fn exceeds(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

/// Assign a risk label from the five supplier KPIs
pub fn label_risk(kpis: &KpiVector) -> RiskLabel {
    let delay = kpis.avg_delivery_delay_days;
    if kpis.late_delivery_rate > HIGH_LATE_RATE || exceeds(delay, HIGH_DELAY_DAYS) {
        RiskLabel::High
    } else if kpis.late_delivery_rate > MEDIUM_LATE_RATE || exceeds(delay, MEDIUM_DELAY_DAYS) {
        RiskLabel::Medium
    } else {
        RiskLabel::Low
    }
}

/// Label every aggregated supplier
pub fn label_suppliers(metrics: Vec<SupplierMetrics>) -> Vec<SupplierFeature> {
    let features: Vec<SupplierFeature> = metrics
        .into_iter()
        .map(|m| {
            let label = label_risk(&m.kpis);
            SupplierFeature::new(m.vendor, m.kpis, label)
        })
        .collect();

    for label in RiskLabel::ALL {
        let count = features.iter().filter(|f| f.risk_label == label).count();
        info!("  {:<6} {}", label.as_str(), count);
    }
    features
}

/// Rows whose stored label disagrees with the rule table
pub fn mislabeled(features: &[SupplierFeature]) -> Vec<&SupplierFeature> {
    features
        .iter()
        .filter(|f| label_risk(&f.kpis()) != f.risk_label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpis(late_rate: f64, delay: Option<f64>) -> KpiVector {
        KpiVector {
            avg_delivery_delay_days: delay,
            avg_fulfillment_time_days: Some(10.0),
            late_delivery_rate: late_rate,
            avg_freight_cost: 500.0,
            avg_order_value: 10_000.0,
        }
    }

    #[test]
    fn test_high_takes_precedence() {
        assert_eq!(label_risk(&kpis(0.6, Some(1.0))), RiskLabel::High);
        assert_eq!(label_risk(&kpis(0.0, Some(5.5))), RiskLabel::High);
        assert_eq!(label_risk(&kpis(0.3, Some(6.0))), RiskLabel::High);
    }

    #[test]
    fn test_medium() {
        assert_eq!(label_risk(&kpis(0.3, Some(1.0))), RiskLabel::Medium);
        assert_eq!(label_risk(&kpis(0.1, Some(2.5))), RiskLabel::Medium);
    }

    #[test]
    fn test_low() {
        assert_eq!(label_risk(&kpis(0.1, Some(0.0))), RiskLabel::Low);
        assert_eq!(label_risk(&kpis(0.1, None)), RiskLabel::Low);
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(label_risk(&kpis(0.5, Some(5.0))), RiskLabel::Medium);
        assert_eq!(label_risk(&kpis(0.25, Some(2.0))), RiskLabel::Low);
    }

    #[test]
    fn test_stored_labels_match_rules() {
        let metrics = vec![
            SupplierMetrics { vendor: "A".into(), shipments: 3, kpis: kpis(0.6, Some(1.0)) },
            SupplierMetrics { vendor: "B".into(), shipments: 2, kpis: kpis(0.3, None) },
            SupplierMetrics { vendor: "C".into(), shipments: 9, kpis: kpis(0.0, Some(-1.0)) },
        ];
        let mut features = label_suppliers(metrics);
        assert!(mislabeled(&features).is_empty());

        features[2].risk_label = RiskLabel::High;
        let bad = mislabeled(&features);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].vendor, "C");
    }
}
