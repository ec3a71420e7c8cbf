//! Stage drivers shared by the binaries: raw CSV to feature file, feature
//! file to saved model.

use std::path::Path;

use crate::aggregate::aggregate_suppliers;
use crate::config::TrainConfig;
use crate::error::Result;
use crate::io::{read_features, read_shipments, write_features};
use crate::labeler::label_suppliers;
use crate::models::SupplierFeature;
use crate::normalize::{normalize, NormalizeStats};
use crate::train::{train_model, TrainOutcome};

#[derive(Debug)]
pub struct PreprocessOutcome {
    pub stats: NormalizeStats,
    pub features: Vec<SupplierFeature>,
}

/// Read, normalize, aggregate, label and write the supplier feature file
pub fn preprocess(raw_path: &Path, features_path: &Path) -> Result<PreprocessOutcome> {
    let records = read_shipments(raw_path)?;
    let normalized = normalize(records);
    let suppliers = aggregate_suppliers(&normalized.shipments);
    let features = label_suppliers(suppliers);
    write_features(features_path, &features)?;

    Ok(PreprocessOutcome {
        stats: normalized.stats,
        features,
    })
}

/// Train on the feature file and persist the model artifact
pub fn train_and_save(features_path: &Path, model_path: &Path, config: &TrainConfig) -> Result<TrainOutcome> {
    let features = read_features(features_path)?;
    let outcome = train_model(&features, config)?;
    outcome.artifact.save(model_path)?;
    Ok(outcome)
}
