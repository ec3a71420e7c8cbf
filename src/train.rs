//! Classifier training: rare-class merge, label encoding, stratified split,
//! forest fit, hold-out evaluation and feature importance.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::artifact::{FeatureImputer, ModelArtifact};
use crate::codec::LabelCodec;
use crate::config::TrainConfig;
use crate::error::{PipelineError, Result};
use crate::forest::RandomForest;
use crate::metrics::{classification_report, ClassificationReport};
use crate::models::{KpiVector, RiskLabel, SupplierFeature, FEATURE_NAMES};

/// Label to merge rare classes into
pub const MERGE_TARGET: RiskLabel = RiskLabel::Medium;

pub fn class_distribution(features: &[SupplierFeature]) -> BTreeMap<RiskLabel, usize> {
    let mut counts = BTreeMap::new();
    for f in features {
        *counts.entry(f.risk_label).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct RareClassMerge {
    pub features: Vec<SupplierFeature>,
    /// Classes that had fewer than the minimum support and were relabeled
    pub merged: Vec<RiskLabel>,
}

/// Relabel every class with fewer than `min_support` rows as Medium.
/// Returns a new feature set; the input is left untouched.
pub fn merge_rare_classes(features: &[SupplierFeature], min_support: usize) -> RareClassMerge {
    let merged: Vec<RiskLabel> = class_distribution(features)
        .into_iter()
        .filter(|(_, count)| *count < min_support)
        .map(|(label, _)| label)
        .collect();

    let features = features
        .iter()
        .cloned()
        .map(|mut f| {
            if merged.contains(&f.risk_label) {
                f.risk_label = MERGE_TARGET;
            }
            f
        })
        .collect();

    RareClassMerge { features, merged }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Per-class hold-out sizes: floor of the proportional share, remainder
/// handed out by largest fractional part. Every class keeps at least one
/// training row.
fn allocate_test_counts(counts: &[usize], n_test: usize) -> Option<Vec<usize>> {
    let n: usize = counts.iter().sum();
    let shares: Vec<f64> = counts.iter().map(|&c| c as f64 * n_test as f64 / n as f64).collect();
    let mut alloc: Vec<usize> = counts
        .iter()
        .zip(&shares)
        .map(|(&c, s)| (s.floor() as usize).min(c.saturating_sub(1)))
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.total_cmp(&fa).then(counts[b].cmp(&counts[a])).then(a.cmp(&b))
    });

    let mut remaining = n_test.saturating_sub(alloc.iter().sum());
    while remaining > 0 {
        let mut progressed = false;
        for &c in &order {
            if remaining == 0 {
                break;
            }
            if alloc[c] + 1 < counts[c] {
                alloc[c] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            return None;
        }
    }
    Some(alloc)
}

/// Split row indices so each class keeps its proportion in both parts.
/// The hold-out size is `ceil(test_fraction * n)`.
pub fn stratified_split(y: &[usize], n_classes: usize, test_fraction: f64, seed: u64) -> Result<StratifiedSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::StratificationInfeasible(format!(
            "test fraction {test_fraction} must be between 0 and 1"
        )));
    }
    let n = y.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);

    let mut counts = vec![0usize; n_classes];
    for &label in y {
        counts[label] += 1;
    }
    let present: Vec<usize> = (0..n_classes).filter(|&c| counts[c] > 0).collect();

    if let Some(&c) = present.iter().find(|&&c| counts[c] < 2) {
        return Err(PipelineError::StratificationInfeasible(format!(
            "class id {c} has a single member"
        )));
    }
    if n_test < present.len() || n_train < present.len() {
        return Err(PipelineError::StratificationInfeasible(format!(
            "{n} rows give {n_train} train / {n_test} test, fewer than the {} classes",
            present.len()
        )));
    }

    let alloc = allocate_test_counts(&counts, n_test).ok_or_else(|| {
        PipelineError::StratificationInfeasible(format!("cannot place {n_test} hold-out rows"))
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = StratifiedSplit { train: Vec::with_capacity(n_train), test: Vec::with_capacity(n_test) };
    for class in 0..n_classes {
        let mut members: Vec<usize> = (0..n).filter(|&i| y[i] == class).collect();
        members.shuffle(&mut rng);
        let (test, train) = members.split_at(alloc[class]);
        split.test.extend_from_slice(test);
        split.train.extend_from_slice(train);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Importances paired with feature names, most important first
pub fn rank_feature_importance(importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(importances)
        .map(|(name, &importance)| FeatureImportance { feature: name.to_string(), importance })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub distribution_before: BTreeMap<RiskLabel, usize>,
    pub distribution_after: BTreeMap<RiskLabel, usize>,
    pub merged: Vec<RiskLabel>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluation: ClassificationReport,
    pub feature_importance: Vec<FeatureImportance>,
}

#[derive(Debug)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub report: TrainingReport,
}

fn feature_rows(imputer: &FeatureImputer, kpis: &[KpiVector], idx: &[usize]) -> Vec<Vec<f64>> {
    idx.iter().map(|&i| imputer.transform(&kpis[i])).collect()
}

/// Train the learned classifier on labeled supplier features
pub fn train_model(features: &[SupplierFeature], config: &TrainConfig) -> Result<TrainOutcome> {
    if features.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let distribution_before = class_distribution(features);
    info!("Class distribution before merge: {:?}", distribution_before);

    let RareClassMerge { features, merged } = merge_rare_classes(features, config.min_class_support);
    let distribution_after = class_distribution(&features);
    if !merged.is_empty() {
        warn!("Rare classes merged into {}: {:?}", MERGE_TARGET, merged);
        info!("Class distribution after merge: {:?}", distribution_after);
    }

    if distribution_after.len() < 2 {
        return Err(PipelineError::InsufficientClasses {
            found: distribution_after.keys().map(|l| l.to_string()).collect(),
        });
    }

    let labels: Vec<RiskLabel> = features.iter().map(|f| f.risk_label).collect();
    let codec = LabelCodec::fit(&labels);
    let y = codec.encode_all(&labels)?;

    let split = stratified_split(&y, codec.len(), config.test_fraction, config.seed)?;
    info!("Split {} suppliers into {} train / {} test", y.len(), split.train.len(), split.test.len());

    let kpis: Vec<KpiVector> = features.iter().map(SupplierFeature::kpis).collect();
    let train_kpis: Vec<KpiVector> = split.train.iter().map(|&i| kpis[i]).collect();
    let imputer = FeatureImputer::fit(&train_kpis);

    let x_train = feature_rows(&imputer, &kpis, &split.train);
    let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
    let x_test = feature_rows(&imputer, &kpis, &split.test);
    let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();

    let forest = RandomForest::fit(&x_train, &y_train, codec.len(), config.forest_params())?;
    info!("Fitted {} trees (max depth {})", forest.n_trees(), config.max_depth);

    let y_pred: Vec<usize> = x_test.iter().map(|row| forest.predict(row)).collect();
    let evaluation = classification_report(&y_test, &y_pred, &codec.class_names());
    let feature_importance = rank_feature_importance(forest.feature_importances());

    let report = TrainingReport {
        distribution_before,
        distribution_after,
        merged,
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        evaluation,
        feature_importance,
    };

    Ok(TrainOutcome {
        artifact: ModelArtifact::new(codec, imputer, forest),
        report,
    })
}

fn write_distribution(f: &mut fmt::Formatter<'_>, dist: &BTreeMap<RiskLabel, usize>) -> fmt::Result {
    for (label, count) in dist.iter().rev() {
        writeln!(f, "  {:<10} {:>6}", label.as_str(), count)?;
    }
    Ok(())
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Class distribution before fix:")?;
        write_distribution(f, &self.distribution_before)?;
        if !self.merged.is_empty() {
            let merged: Vec<&str> = self.merged.iter().map(|l| l.as_str()).collect();
            writeln!(f, "\n⚠️  Rare classes found: {:?} → merged into {}", merged, MERGE_TARGET)?;
            writeln!(f, "Class distribution after fix:")?;
            write_distribution(f, &self.distribution_after)?;
        }

        writeln!(f, "\n📊 Classification Report ({} train / {} test):\n", self.train_rows, self.test_rows)?;
        write!(f, "{}", self.evaluation)?;

        writeln!(f, "\n🔍 Feature Importance (most → least important):")?;
        for fi in &self.feature_importance {
            let bar = "▓".repeat((fi.importance * 40.0).round() as usize);
            writeln!(f, "  {:<28} {:>8.4} {}", fi.feature, fi.importance, bar)?;
        }
        Ok(())
    }
}
