use std::collections::BTreeSet;

use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use supplier_risk::classifier::{compare, RuleBasedClassifier};
use supplier_risk::config::TrainConfig;
use supplier_risk::io::read_features;
use supplier_risk::labeler::{label_risk, mislabeled};
use supplier_risk::models::KpiVector;
use supplier_risk::normalize::parse_date;
use supplier_risk::pipeline::{preprocess, train_and_save};
use supplier_risk::predict::RiskPredictor;
use supplier_risk::synthetic::{generate, RawShipmentRow, SyntheticParams};
use supplier_risk::RiskLabel;

fn write_raw(path: &std::path::Path, seed: u64) -> Vec<RawShipmentRow> {
    let params = SyntheticParams {
        suppliers: 60,
        min_shipments: 10,
        max_shipments: 30,
        ..SyntheticParams::default()
    };
    let (_, rows) = generate(&params, &mut StdRng::seed_from_u64(seed));
    let mut writer = WriterBuilder::new().from_path(path).unwrap();
    for row in &rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
    rows
}

#[test]
fn test_end_to_end_on_synthetic_data() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("supply_chain.csv");
    let features_path = dir.path().join("data").join("supplier_features.csv");
    let model_path = dir.path().join("models").join("model.json");

    let rows = write_raw(&raw, 42);
    let dated = |r: &RawShipmentRow| {
        [&r.po_sent_to_vendor_date, &r.scheduled_delivery_date, &r.delivered_to_client_date]
            .iter()
            .any(|d| parse_date(d).is_some())
    };
    let expected_vendors: BTreeSet<&str> = rows
        .iter()
        .filter(|r| dated(r) && !r.vendor.is_empty())
        .map(|r| r.vendor.as_str())
        .collect();
    let blank_vendor_rows = rows.iter().filter(|r| dated(r) && r.vendor.is_empty()).count();

    let preprocessed = preprocess(&raw, &features_path).unwrap();
    assert_eq!(preprocessed.stats.input_rows, rows.len());
    assert_eq!(preprocessed.stats.dropped_no_vendor, blank_vendor_rows);
    assert_eq!(preprocessed.features.len(), expected_vendors.len());

    // sorted by vendor and consistent with the rule table
    let vendors: Vec<&String> = preprocessed.features.iter().map(|f| &f.vendor).collect();
    let mut sorted = vendors.clone();
    sorted.sort();
    assert_eq!(vendors, sorted);
    for f in &preprocessed.features {
        assert_eq!(f.risk_label, label_risk(&f.kpis()));
        assert!((0.0..=1.0).contains(&f.late_delivery_rate));
    }

    let features = read_features(&features_path).unwrap();
    assert!(mislabeled(&features).is_empty());

    let config = TrainConfig {
        n_trees: 30,
        ..TrainConfig::default()
    };
    let outcome = train_and_save(&features_path, &model_path, &config).unwrap();
    assert!(model_path.exists());
    assert_eq!(outcome.report.train_rows + outcome.report.test_rows, features.len());

    let total: f64 = outcome.report.feature_importance.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);

    let predictor = RiskPredictor::load(&model_path).unwrap();
    let agreement = compare(&RuleBasedClassifier, predictor.classifier(), &features).unwrap();
    assert_eq!(agreement.total, features.len());
    assert!(agreement.rate() > 0.7, "agreement {}", agreement.rate());

    let prediction = predictor
        .predict(KpiVector {
            avg_delivery_delay_days: Some(3.0),
            avg_fulfillment_time_days: Some(12.0),
            late_delivery_rate: 0.4,
            avg_freight_cost: 800.0,
            avg_order_value: 15_000.0,
        })
        .unwrap();
    assert!(RiskLabel::ALL.contains(&prediction.risk));
}

#[test]
fn test_training_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let features_path = dir.path().join("features.csv");
    write_raw(&raw, 7);
    preprocess(&raw, &features_path).unwrap();

    let config = TrainConfig {
        n_trees: 15,
        ..TrainConfig::default()
    };
    let a = train_and_save(&features_path, &dir.path().join("a.json"), &config).unwrap();
    let b = train_and_save(&features_path, &dir.path().join("b.json"), &config).unwrap();
    assert_eq!(a.report.evaluation, b.report.evaluation);
    assert_eq!(a.report.feature_importance, b.report.feature_importance);
}
