//! Supplier aggregator: per-vendor mean KPIs over normalized shipments

use std::collections::BTreeMap;
use tracing::info;

use crate::models::{KpiVector, NormalizedShipment, SupplierMetrics};

/// Running sum and count for a mean that skips nulls
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct SupplierAccumulator {
    shipments: usize,
    delay: Mean,
    fulfillment: Mean,
    late: Mean,
    freight: Mean,
    order_value: Mean,
}

impl SupplierAccumulator {
    fn push(&mut self, s: &NormalizedShipment) {
        self.shipments += 1;
        self.delay.push(s.delivery_delay_days.map(|d| d as f64));
        self.fulfillment.push(s.fulfillment_time_days.map(|d| d as f64));
        self.late.push(Some(f64::from(s.late_flag)));
        self.freight.push(Some(s.freight_cost));
        self.order_value.push(Some(s.line_item_value));
    }

    fn finish(self, vendor: String) -> SupplierMetrics {
        SupplierMetrics {
            vendor,
            shipments: self.shipments,
            kpis: KpiVector {
                avg_delivery_delay_days: self.delay.value(),
                avg_fulfillment_time_days: self.fulfillment.value(),
                // every accumulator has at least one shipment
                late_delivery_rate: self.late.value().unwrap_or_default(),
                avg_freight_cost: self.freight.value().unwrap_or_default(),
                avg_order_value: self.order_value.value().unwrap_or_default(),
            },
        }
    }
}

/// Group shipments by exact vendor string and average each KPI. Output is
/// one entry per distinct vendor, sorted by vendor.
pub fn aggregate_suppliers(shipments: &[NormalizedShipment]) -> Vec<SupplierMetrics> {
    let mut groups: BTreeMap<&str, SupplierAccumulator> = BTreeMap::new();
    for shipment in shipments {
        groups.entry(shipment.vendor.as_str()).or_default().push(shipment);
    }

    let metrics: Vec<SupplierMetrics> = groups
        .into_iter()
        .map(|(vendor, acc)| acc.finish(vendor.to_string()))
        .collect();

    info!("Aggregated {} shipments into {} suppliers", shipments.len(), metrics.len());
    metrics
}
