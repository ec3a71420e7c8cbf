//! Risk classification strategies over the shared KPI schema

use crate::artifact::ModelArtifact;
use crate::error::Result;
use crate::labeler::label_risk;
use crate::models::{KpiVector, RiskLabel, SupplierFeature};

pub trait RiskClassifier {
    fn name(&self) -> &'static str;

    fn classify(&self, kpis: &KpiVector) -> Result<RiskLabel>;
}

/// The business rule table; needs no trained model
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RiskClassifier for RuleBasedClassifier {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn classify(&self, kpis: &KpiVector) -> Result<RiskLabel> {
        Ok(label_risk(kpis))
    }
}

/// A trained forest plus the codec that names its classes
#[derive(Debug, Clone)]
pub struct LearnedClassifier {
    artifact: ModelArtifact,
}

impl LearnedClassifier {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Class probabilities, labeled through the codec
    pub fn predict_proba(&self, kpis: &KpiVector) -> Result<Vec<(RiskLabel, f64)>> {
        let row = self.artifact.imputer.transform(kpis);
        self.artifact
            .forest
            .predict_proba(&row)
            .into_iter()
            .enumerate()
            .map(|(id, p)| Ok((self.artifact.codec.decode(id)?, p)))
            .collect()
    }
}

impl RiskClassifier for LearnedClassifier {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn classify(&self, kpis: &KpiVector) -> Result<RiskLabel> {
        let row = self.artifact.imputer.transform(kpis);
        self.artifact.codec.decode(self.artifact.forest.predict(&row))
    }
}

/// How often two strategies give the same label
#[derive(Debug, Clone, PartialEq)]
pub struct Agreement {
    pub total: usize,
    pub agreed: usize,
    /// (vendor, first strategy's label, second strategy's label)
    pub disagreements: Vec<(String, RiskLabel, RiskLabel)>,
}

impl Agreement {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.agreed as f64 / self.total as f64
        }
    }
}

pub fn compare(a: &dyn RiskClassifier, b: &dyn RiskClassifier, features: &[SupplierFeature]) -> Result<Agreement> {
    let mut agreement = Agreement {
        total: features.len(),
        agreed: 0,
        disagreements: Vec::new(),
    };
    for feature in features {
        let kpis = feature.kpis();
        let (la, lb) = (a.classify(&kpis)?, b.classify(&kpis)?);
        if la == lb {
            agreement.agreed += 1;
        } else {
            agreement.disagreements.push((feature.vendor.clone(), la, lb));
        }
    }
    Ok(agreement)
}
