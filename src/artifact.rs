//! Model artifact: fitted forest, label codec and feature imputation
//! medians, persisted together as one JSON document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::codec::LabelCodec;
use crate::error::{PipelineError, Result};
use crate::forest::RandomForest;
use crate::models::{KpiVector, FEATURE_NAMES};
use crate::normalize::median;

pub const ARTIFACT_VERSION: u32 = 1;

/// Fills missing KPI averages with the medians seen at training time, so
/// training and inference build feature rows the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImputer {
    medians: [f64; 5],
}

impl FeatureImputer {
    pub fn fit(rows: &[KpiVector]) -> Self {
        let mut medians = [0.0; 5];
        for (col, slot) in medians.iter_mut().enumerate() {
            let column: Vec<Option<f64>> = rows.iter().map(|r| r.values()[col]).collect();
            *slot = median(&column).unwrap_or(0.0);
        }
        Self { medians }
    }

    pub fn transform(&self, kpis: &KpiVector) -> Vec<f64> {
        kpis.values()
            .iter()
            .zip(self.medians)
            .map(|(v, m)| v.unwrap_or(m))
            .collect()
    }

    pub fn medians(&self) -> &[f64; 5] {
        &self.medians
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub codec: LabelCodec,
    pub imputer: FeatureImputer,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(codec: LabelCodec, imputer: FeatureImputer, forest: RandomForest) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            codec,
            imputer,
            forest,
        }
    }

    /// Consistency between the pieces; the error is a human-readable reason
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version != ARTIFACT_VERSION {
            return Err(format!(
                "artifact version {} (expected {})",
                self.version, ARTIFACT_VERSION
            ));
        }
        if self.feature_names != FEATURE_NAMES {
            return Err(format!(
                "feature names {:?} (expected {:?})",
                self.feature_names, FEATURE_NAMES
            ));
        }
        if self.codec.len() != self.forest.n_classes() {
            return Err(format!(
                "codec has {} classes but model has {}",
                self.codec.len(),
                self.forest.n_classes()
            ));
        }
        if self.forest.n_features() != FEATURE_NAMES.len() || !self.forest.is_well_formed() {
            return Err("model trees are malformed".to_string());
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        info!("Model saved to {}", path.display());
        Ok(())
    }

    /// Load and validate. Every failure is reported as `ArtifactUnavailable`.
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| PipelineError::ArtifactUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| unavailable(format!("corrupt artifact: {e}")))?;
        artifact.validate().map_err(unavailable)?;

        info!(
            "Loaded model trained at {} ({} trees, classes {:?})",
            artifact.trained_at,
            artifact.forest.n_trees(),
            artifact.codec.class_names()
        );
        Ok(artifact)
    }
}
