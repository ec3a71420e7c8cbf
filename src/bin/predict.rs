//! Score one supplier KPI vector with the saved model
//!
//! Run: cargo run --bin predict -- --delay 3 --late-rate 0.4

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use supplier_risk::config::PipelineConfig;
use supplier_risk::models::KpiVector;
use supplier_risk::predict::RiskPredictor;

#[derive(Parser, Debug)]
#[command(name = "predict")]
#[command(about = "Predict the risk category of a single supplier")]
struct Args {
    /// Average delivery delay in days
    #[arg(long, default_value = "3.0", allow_negative_numbers = true)]
    delay: f64,

    /// Average fulfillment time in days
    #[arg(long, default_value = "12.0", allow_negative_numbers = true)]
    fulfillment: f64,

    /// Share of late deliveries (0.0 - 1.0)
    #[arg(long, default_value = "0.4")]
    late_rate: f64,

    #[arg(long, default_value = "800.0")]
    freight_cost: f64,

    #[arg(long, default_value = "15000.0")]
    order_value: f64,

    /// Model artifact path
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let model_path = args.model.unwrap_or(PipelineConfig::default().model_path);

    let predictor = RiskPredictor::load(&model_path).context("run the train binary first")?;
    let prediction = predictor.predict(KpiVector {
        avg_delivery_delay_days: Some(args.delay),
        avg_fulfillment_time_days: Some(args.fulfillment),
        late_delivery_rate: args.late_rate,
        avg_freight_cost: args.freight_cost,
        avg_order_value: args.order_value,
    })?;

    println!("{}", prediction);
    Ok(())
}
