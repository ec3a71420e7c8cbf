//! Raw shipments -> labeled supplier feature file
//!
//! Run: cargo run --bin preprocess -- [--input PATH] [--output PATH]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use supplier_risk::config::PipelineConfig;
use supplier_risk::pipeline::preprocess;
use supplier_risk::summary::risk_distribution;

#[derive(Parser, Debug)]
#[command(name = "preprocess")]
#[command(about = "Normalize raw shipments and build labeled supplier features")]
struct Args {
    /// Raw shipment CSV
    #[arg(long)]
    input: Option<PathBuf>,

    /// Supplier feature CSV to write
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let config = PipelineConfig::default();
    let input = args.input.unwrap_or(config.raw_path);
    let output = args.output.unwrap_or(config.features_path);

    let outcome = preprocess(&input, &output)
        .with_context(|| format!("preprocessing {}", input.display()))?;
    let stats = &outcome.stats;

    println!("\n{}", "═".repeat(60));
    println!("  Preprocessing summary");
    println!("{}", "═".repeat(60));
    println!("  Input rows:              {:>8}", stats.input_rows);
    println!("  Unparseable dates:       {:>8}", stats.unparsed_dates);
    println!("  Dropped (no dates):      {:>8}", stats.dropped_no_dates);
    println!("  Unparseable amounts:     {:>8}", stats.unparsed_amounts);
    println!("  Freight imputed:         {:>8}", stats.imputed_freight);
    println!("  Line value imputed:      {:>8}", stats.imputed_line_value);
    println!("  Dropped (no vendor):     {:>8}", stats.dropped_no_vendor);
    println!("  Shipments kept:          {:>8}", stats.output_rows);
    println!("  Suppliers:               {:>8}", outcome.features.len());

    println!("\n  Risk labels");
    println!("  {}", "─".repeat(40));
    for (label, (count, share)) in risk_distribution(&outcome.features).iter().rev() {
        println!("  {:<10} {:>6}  {:>5.1}%", label.as_str(), count, share * 100.0);
    }

    println!("\n✅ Supplier features saved to {}", output.display());
    Ok(())
}
