//! Synthetic procurement data generator
//!
//! Writes a raw shipment CSV in the procurement export layout, with per-vendor
//! reliability tiers and the usual data-quality noise.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --suppliers <N>          Number of vendors (default: 40)
//!   --min-shipments <N>      Fewest shipments per vendor (default: 5)
//!   --max-shipments <N>      Most shipments per vendor (default: 60)
//!   --missing-rate <F>       Share of date cells left blank or placeholder (default: 0.05)
//!   --freight-text-rate <F>  Share of freight cells holding text (default: 0.10)
//!   --seed <N>               Random seed for reproducibility (optional)
//!   --output <PATH>          Output CSV path (default: data/supply_chain.csv)

use anyhow::Result;
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::PathBuf;
use supplier_risk::synthetic::{generate, ReliabilityTier, SyntheticParams};

#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic procurement shipment file")]
struct Args {
    #[arg(long, default_value = "40")]
    suppliers: usize,

    #[arg(long, default_value = "5")]
    min_shipments: usize,

    #[arg(long, default_value = "60")]
    max_shipments: usize,

    /// Probability that a date cell is blank or a placeholder (0.0 - 1.0)
    #[arg(long, default_value = "0.05")]
    missing_rate: f64,

    /// Probability that a freight cell holds text instead of an amount (0.0 - 1.0)
    #[arg(long, default_value = "0.10")]
    freight_text_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "data/supply_chain.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    println!("🔧 Synthetic Procurement Generator");
    println!("{}", "━".repeat(66));
    println!("Output:            {}", args.output.display());
    println!("Suppliers:         {}", args.suppliers);
    println!("Shipments/vendor:  {}-{}", args.min_shipments, args.max_shipments);
    println!("Missing dates:     {:.1}%", args.missing_rate * 100.0);
    println!("Freight as text:   {:.1}%", args.freight_text_rate * 100.0);
    if let Some(seed) = args.seed {
        println!("Random seed:       {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let params = SyntheticParams {
        suppliers: args.suppliers,
        min_shipments: args.min_shipments,
        max_shipments: args.max_shipments,
        missing_rate: args.missing_rate,
        freight_text_rate: args.freight_text_rate,
        ..SyntheticParams::default()
    };

    println!("🏭 Generating shipments...");
    let (profiles, rows) = generate(&params, &mut rng);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(&args.output)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let tier_count = |tier: ReliabilityTier| profiles.iter().filter(|p| p.tier == tier).count();

    println!("\n✅ Generation complete!");
    println!("{}", "━".repeat(66));
    println!("Shipments written: {:>8}", rows.len());
    println!("Reliable vendors:  {:>8}", tier_count(ReliabilityTier::Reliable));
    println!("Shaky vendors:     {:>8}", tier_count(ReliabilityTier::Shaky));
    println!("Poor vendors:      {:>8}", tier_count(ReliabilityTier::Poor));
    println!("Output file:       {}", args.output.display());

    Ok(())
}
