//! Label codec: risk labels <-> dense class ids
//!
//! Classes are ordered by label name, so a codec fitted on all three labels
//! maps High=0, Low=1, Medium=2.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::RiskLabel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<RiskLabel>,
}

impl LabelCodec {
    /// Fit on the labels present in a dataset
    pub fn fit(labels: &[RiskLabel]) -> Self {
        let mut classes: Vec<RiskLabel> = labels.to_vec();
        classes.sort_by_key(|l| l.as_str());
        classes.dedup();
        Self { classes }
    }

    pub fn encode(&self, label: RiskLabel) -> Result<usize> {
        self.classes
            .iter()
            .position(|c| *c == label)
            .ok_or_else(|| PipelineError::UnknownLabel(label.to_string()))
    }

    pub fn encode_all(&self, labels: &[RiskLabel]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(*l)).collect()
    }

    pub fn decode(&self, class_id: usize) -> Result<RiskLabel> {
        self.classes
            .get(class_id)
            .copied()
            .ok_or(PipelineError::UnknownClassId(class_id))
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_labels() {
        let codec = LabelCodec::fit(&[RiskLabel::Low, RiskLabel::High, RiskLabel::Medium, RiskLabel::Low]);
        assert_eq!(codec.len(), 3);
        for label in RiskLabel::ALL {
            let id = codec.encode(label).unwrap();
            assert_eq!(codec.decode(id).unwrap(), label);
        }
    }

    #[test]
    fn test_alphabetical_ids() {
        let codec = LabelCodec::fit(&RiskLabel::ALL);
        assert_eq!(codec.encode(RiskLabel::High).unwrap(), 0);
        assert_eq!(codec.encode(RiskLabel::Low).unwrap(), 1);
        assert_eq!(codec.encode(RiskLabel::Medium).unwrap(), 2);
    }

    #[test]
    fn test_unknown_values() {
        let codec = LabelCodec::fit(&[RiskLabel::Low, RiskLabel::Medium]);
        assert!(matches!(codec.encode(RiskLabel::High), Err(PipelineError::UnknownLabel(_))));
        assert!(matches!(codec.decode(2), Err(PipelineError::UnknownClassId(2))));
    }
}
