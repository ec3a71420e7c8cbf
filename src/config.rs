//! Pipeline configuration
//!
//! Defaults: 300 trees of depth 6, seed 42,
//! 20% stratified hold-out, classes with fewer than 2 suppliers merged.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::forest::ForestParams;

/// File locations shared by the pipeline stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub raw_path: PathBuf,
    pub features_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/supply_chain.csv"),
            features_path: PathBuf::from("data/supplier_features.csv"),
            model_path: PathBuf::from("models/supplier_risk_model.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    /// Classes with fewer suppliers than this are relabeled Medium
    pub min_class_support: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            n_trees: 300,
            max_depth: 6,
            min_class_support: 2,
        }
    }
}

impl TrainConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            seed: self.seed,
            ..ForestParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forest_params_follow_config() {
        let config = TrainConfig { n_trees: 10, max_depth: 3, seed: 7, ..TrainConfig::default() };
        let params = config.forest_params();
        assert_eq!(params.n_trees, 10);
        assert_eq!(params.max_depth, 3);
        assert_eq!(params.seed, 7);
        assert_eq!(params.min_samples_split, 2);
    }
}
