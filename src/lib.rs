pub mod aggregate;
pub mod artifact;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod forest;
pub mod io;
pub mod labeler;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod predict;
pub mod summary;
pub mod synthetic;
pub mod train;

pub use error::{PipelineError, Result};
pub use models::{KpiVector, RiskLabel, SupplierFeature, SupplierMetrics};
