//! Exploratory look at the supplier feature file
//!
//! Run: cargo run --bin eda -- [section]
//! Sections: all, head, describe, risk

use anyhow::{Context, Result};
use std::env;
use supplier_risk::config::PipelineConfig;
use supplier_risk::io::read_features;
use supplier_risk::models::SupplierFeature;
use supplier_risk::summary::{describe_features, risk_distribution};

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(85));
    println!("  {}", title);
    println!("{}\n", "═".repeat(85));
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn run_head(features: &[SupplierFeature]) {
    print_section_header("FIRST ROWS");
    println!(
        "  {:<32} {:>8} {:>8} {:>6} {:>10} {:>12} {:>7}",
        "Vendor", "Delay", "Fulfil", "Late", "Freight", "Order", "Risk"
    );
    println!("  {}", "─".repeat(89));
    for f in features.iter().take(5) {
        let vendor: String = f.vendor.chars().take(32).collect();
        println!(
            "  {:<32} {:>8} {:>8} {:>6.2} {:>10.2} {:>12.2} {:>7}",
            vendor,
            fmt_opt(f.avg_delivery_delay_days),
            fmt_opt(f.avg_fulfillment_time_days),
            f.late_delivery_rate,
            f.avg_freight_cost,
            f.avg_order_value,
            f.risk_label
        );
    }
}

fn run_describe(features: &[SupplierFeature]) {
    print_section_header("SUMMARY STATISTICS");
    println!(
        "  {:<26} {:>6} {:>11} {:>11} {:>10} {:>10} {:>10} {:>10} {:>11}",
        "Feature", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
    );
    println!("  {}", "─".repeat(113));
    for s in describe_features(features) {
        println!(
            "  {:<26} {:>6} {:>11.2} {:>11.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>11.2}",
            s.name, s.count, s.mean, s.std, s.min, s.p25, s.p50, s.p75, s.max
        );
    }
}

fn run_risk(features: &[SupplierFeature]) {
    print_section_header("RISK LABEL DISTRIBUTION");
    for (label, (count, share)) in risk_distribution(features).iter().rev() {
        let bar = "█".repeat((share * 50.0).round() as usize);
        println!("  {:<8} {:>5} ({:>5.1}%) {}", label.as_str(), count, share * 100.0, bar);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args: Vec<String> = env::args().collect();
    let section = args.get(1).map(|s| s.as_str()).unwrap_or("all");

    let features = read_features(&PipelineConfig::default().features_path).context("run the preprocess binary first")?;
    println!("\n{} suppliers loaded", features.len());

    match section {
        "all" => {
            run_head(&features);
            run_describe(&features);
            run_risk(&features);
        }
        "head" => run_head(&features),
        "describe" => run_describe(&features),
        "risk" => run_risk(&features),
        _ => {
            println!("Unknown section: {}", section);
            println!("Available: all, head, describe, risk");
        }
    }

    Ok(())
}
