//! Train the supplier risk classifier on the feature file
//!
//! Run: cargo run --release --bin train -- [--trees N] [--max-depth N] [--seed N]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use supplier_risk::classifier::{compare, LearnedClassifier, RiskClassifier, RuleBasedClassifier};
use supplier_risk::models::FEATURE_NAMES;
use supplier_risk::config::{PipelineConfig, TrainConfig};
use supplier_risk::io::read_features;
use supplier_risk::pipeline::train_and_save;

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train a random forest on labeled supplier features")]
struct Args {
    /// Supplier feature CSV
    #[arg(long)]
    features: Option<PathBuf>,

    /// Where to write the model artifact
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, default_value = "300")]
    trees: usize,

    #[arg(long, default_value = "6")]
    max_depth: usize,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Hold-out share for evaluation
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let paths = PipelineConfig::default();
    let features_path = args.features.unwrap_or(paths.features_path);
    let model_path = args.model.unwrap_or(paths.model_path);

    let config = TrainConfig {
        seed: args.seed,
        test_fraction: args.test_fraction,
        n_trees: args.trees,
        max_depth: args.max_depth,
        ..TrainConfig::default()
    };

    let outcome = train_and_save(&features_path, &model_path, &config)
        .with_context(|| format!("training on {}", features_path.display()))?;

    println!("\n{}", "═".repeat(70));
    println!("  Supplier risk model");
    println!("{}\n", "═".repeat(70));
    println!("{}", outcome.report);

    println!("\n🧩 Fill values for missing KPIs (training medians):");
    for (name, median) in FEATURE_NAMES.iter().zip(outcome.artifact.imputer.medians()) {
        println!("  {:<28} {:>12.2}", name, median);
    }

    // the learned model should reproduce the rule table on its own training data
    let features = read_features(&features_path)?;
    let learned = LearnedClassifier::new(outcome.artifact);
    let rules = RuleBasedClassifier;
    let agreement = compare(&rules, &learned, &features)?;
    println!(
        "\n🤝 {} vs {} agreement: {}/{} ({:.1}%)",
        rules.name(),
        learned.name(),
        agreement.agreed,
        agreement.total,
        agreement.rate() * 100.0
    );
    for (vendor, rule, model) in agreement.disagreements.iter().take(10) {
        println!("  {:<40} {}={:<6} {}={}", vendor, rules.name(), rule, learned.name(), model);
    }

    println!("\n✅ Model saved to {}", model_path.display());
    Ok(())
}
