//! Descriptive statistics over the supplier feature table

use std::collections::BTreeMap;

use crate::models::{RiskLabel, SupplierFeature, FEATURE_NAMES};
use crate::train::class_distribution;

/// count / mean / std / min / quartiles / max of one column, nulls skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn describe(name: &str, values: &[Option<f64>]) -> Option<ColumnSummary> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let count = present.len();
    let mean = present.iter().sum::<f64>() / count as f64;
    // sample standard deviation
    let std = if count > 1 {
        (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    Some(ColumnSummary {
        name: name.to_string(),
        count,
        mean,
        std,
        min: present[0],
        p25: quantile(&present, 0.25),
        p50: quantile(&present, 0.5),
        p75: quantile(&present, 0.75),
        max: present[count - 1],
    })
}

pub fn describe_features(features: &[SupplierFeature]) -> Vec<ColumnSummary> {
    FEATURE_NAMES
        .iter()
        .enumerate()
        .filter_map(|(col, name)| {
            let column: Vec<Option<f64>> = features.iter().map(|f| f.kpis().values()[col]).collect();
            describe(name, &column)
        })
        .collect()
}

/// Share of suppliers per risk label, all three labels present
pub fn risk_distribution(features: &[SupplierFeature]) -> BTreeMap<RiskLabel, (usize, f64)> {
    let counts = class_distribution(features);
    let total = features.len().max(1) as f64;
    RiskLabel::ALL
        .iter()
        .map(|label| {
            let n = counts.get(label).copied().unwrap_or(0);
            (*label, (n, n as f64 / total))
        })
        .collect()
}
