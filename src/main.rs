use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use supplier_risk::classifier::{compare, RiskClassifier, RuleBasedClassifier};
use supplier_risk::config::{PipelineConfig, TrainConfig};
use supplier_risk::models::KpiVector;
use supplier_risk::pipeline::{preprocess, train_and_save};
use supplier_risk::predict::RiskPredictor;
use tracing::info;

/// Run every stage: preprocess, train, save, then score a sample supplier
#[derive(Parser, Debug)]
#[command(name = "supplier_risk")]
struct Args {
    #[arg(long)]
    raw: Option<PathBuf>,

    #[arg(long)]
    features: Option<PathBuf>,

    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, default_value = "300")]
    trees: usize,

    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();
    let defaults = PipelineConfig::default();
    let config = PipelineConfig {
        raw_path: args.raw.unwrap_or(defaults.raw_path),
        features_path: args.features.unwrap_or(defaults.features_path),
        model_path: args.model.unwrap_or(defaults.model_path),
    };
    let train_config = TrainConfig {
        n_trees: args.trees,
        seed: args.seed,
        ..TrainConfig::default()
    };

    info!("=== Preprocessing ===");
    let preprocessed = preprocess(&config.raw_path, &config.features_path)
        .with_context(|| format!("preprocessing {}", config.raw_path.display()))?;
    info!(
        "{} shipments -> {} suppliers",
        preprocessed.stats.output_rows,
        preprocessed.features.len()
    );

    info!("=== Training ===");
    let outcome = train_and_save(&config.features_path, &config.model_path, &train_config)?;
    println!("{}", outcome.report);

    info!("=== Prediction ===");
    let predictor = RiskPredictor::load(&config.model_path)?;
    let agreement = compare(&RuleBasedClassifier, predictor.classifier(), &preprocessed.features)?;
    info!(
        "{} agrees with {} on {}/{} suppliers",
        predictor.classifier().name(),
        RuleBasedClassifier.name(),
        agreement.agreed,
        agreement.total
    );

    let sample = KpiVector {
        avg_delivery_delay_days: Some(3.0),
        avg_fulfillment_time_days: Some(12.0),
        late_delivery_rate: 0.4,
        avg_freight_cost: 800.0,
        avg_order_value: 15_000.0,
    };
    println!("{}", predictor.predict(sample)?);

    Ok(())
}
