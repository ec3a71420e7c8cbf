//! Error types for the supplier risk pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline conditions. Recoverable problems (bad dates, bad numbers,
/// dropped rows, rare classes) are logged and never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input source not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("schema mismatch: expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("model artifact unavailable at {}: {reason}", path.display())]
    ArtifactUnavailable { path: PathBuf, reason: String },

    #[error("training needs at least 2 risk classes after merging rare ones, found {found:?}")]
    InsufficientClasses { found: Vec<String> },

    #[error("stratified split infeasible: {0}")]
    StratificationInfeasible(String),

    #[error("no supplier features to train on")]
    EmptyDataset,

    #[error("label {0:?} is not known to the label codec")]
    UnknownLabel(String),

    #[error("class id {0} is not known to the label codec")]
    UnknownClassId(usize),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
