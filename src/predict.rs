//! Single-vector risk prediction with a persisted model

use std::fmt;
use std::path::Path;

use crate::artifact::ModelArtifact;
use crate::classifier::{LearnedClassifier, RiskClassifier};
use crate::error::Result;
use crate::models::{KpiVector, RiskLabel};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub input: KpiVector,
    pub risk: RiskLabel,
    /// Mean leaf probability of the predicted class across trees
    pub confidence: f64,
}

pub struct RiskPredictor {
    classifier: LearnedClassifier,
}

impl RiskPredictor {
    /// Load the artifact; a missing or corrupt file is fatal
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_artifact(ModelArtifact::load(path)?))
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            classifier: LearnedClassifier::new(artifact),
        }
    }

    pub fn classifier(&self) -> &LearnedClassifier {
        &self.classifier
    }

    pub fn predict(&self, input: KpiVector) -> Result<Prediction> {
        let risk = self.classifier.classify(&input)?;
        let confidence = self
            .classifier
            .predict_proba(&input)?
            .into_iter()
            .find(|(label, _)| *label == risk)
            .map(|(_, p)| p)
            .unwrap_or_default();
        Ok(Prediction { input, risk, confidence })
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}"))
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n🚦 Supplier Risk Prediction")?;
        writeln!(f, "Avg Delay (days): {}", fmt_opt(self.input.avg_delivery_delay_days))?;
        writeln!(f, "Fulfillment Time (days): {}", fmt_opt(self.input.avg_fulfillment_time_days))?;
        writeln!(f, "Late Delivery Rate: {}", self.input.late_delivery_rate)?;
        writeln!(f, "Avg Freight Cost: {}", self.input.avg_freight_cost)?;
        writeln!(f, "Avg Order Value: {}", self.input.avg_order_value)?;
        write!(f, "\n👉 Predicted Risk Category: {} ({:.0}% probability)", self.risk, self.confidence * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainConfig;
    use crate::labeler::label_risk;
    use crate::models::SupplierFeature;
    use crate::train::train_model;

    fn kpis(late: f64, delay: f64) -> KpiVector {
        KpiVector {
            avg_delivery_delay_days: Some(delay),
            avg_fulfillment_time_days: Some(12.0),
            late_delivery_rate: late,
            avg_freight_cost: 800.0,
            avg_order_value: 15_000.0,
        }
    }

    fn predictor() -> RiskPredictor {
        let mut features = Vec::new();
        for i in 0..8 {
            let j = i as f64 / 8.0;
            for (name, late, delay) in [("low", 0.05, -1.0), ("med", 0.35, 1.0), ("high", 0.8, 6.0)] {
                let k = kpis(late + 0.1 * j, delay + j);
                features.push(SupplierFeature::new(format!("{name}-{i}"), k, label_risk(&k)));
            }
        }
        let config = TrainConfig { n_trees: 20, ..TrainConfig::default() };
        RiskPredictor::from_artifact(train_model(&features, &config).unwrap().artifact)
    }

    #[test]
    fn test_predicts_clear_cases() {
        let predictor = predictor();
        assert_eq!(predictor.predict(kpis(0.9, 7.0)).unwrap().risk, RiskLabel::High);
        assert_eq!(predictor.predict(kpis(0.05, -1.0)).unwrap().risk, RiskLabel::Low);
    }

    #[test]
    fn test_prediction_echoes_input() {
        let predictor = predictor();
        let input = KpiVector { avg_fulfillment_time_days: None, ..kpis(0.4, 3.0) };
        let prediction = predictor.predict(input).unwrap();
        assert_eq!(prediction.input, input);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);

        let text = prediction.to_string();
        assert!(text.contains("Late Delivery Rate: 0.4"));
        assert!(text.contains("Fulfillment Time (days): n/a"));
        assert!(text.contains(&format!(
            "Predicted Risk Category: {} ({:.0}% probability)",
            prediction.risk,
            prediction.confidence * 100.0
        )));
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RiskPredictor::load(&dir.path().join("missing.json")).is_err());
    }
}
