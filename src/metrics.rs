//! Hold-out evaluation: per-class precision / recall / F1 and a confusion matrix

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    /// `confusion[true][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn weighted_average(label: &str, classes: &[ClassMetrics], weights: &[f64], support: usize) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let mean = |values: Vec<f64>| -> f64 {
        if norm == 0.0 {
            0.0
        } else {
            values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / norm
        }
    };
    ClassMetrics {
        label: label.to_string(),
        precision: mean(classes.iter().map(|c| c.precision).collect()),
        recall: mean(classes.iter().map(|c| c.recall).collect()),
        f1: mean(classes.iter().map(|c| c.f1).collect()),
        support,
    }
}

/// Build a report for class ids `0..class_names.len()`. Undefined ratios
/// (no predictions or no support) are reported as 0.
pub fn classification_report(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> ClassificationReport {
    let k = class_names.len();
    let mut confusion = vec![vec![0usize; k]; k];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < k && p < k {
            confusion[t][p] += 1;
        }
    }

    let classes: Vec<ClassMetrics> = (0..k)
        .map(|c| {
            let tp = confusion[c][c];
            let predicted: usize = (0..k).map(|t| confusion[t][c]).sum();
            let support: usize = confusion[c].iter().sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            ClassMetrics {
                label: class_names[c].clone(),
                precision,
                recall,
                f1: f1(precision, recall),
                support,
            }
        })
        .collect();

    let total: usize = classes.iter().map(|c| c.support).sum();
    let correct: usize = (0..k).map(|c| confusion[c][c]).sum();

    let uniform = vec![1.0; k];
    let by_support: Vec<f64> = classes.iter().map(|c| c.support as f64).collect();
    let macro_avg = weighted_average("macro avg", &classes, &uniform, total);
    let weighted_avg = weighted_average("weighted avg", &classes, &by_support, total);

    ClassificationReport {
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
        classes,
        confusion,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(f, "  {:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", c.label, c.precision, c.recall, c.f1, c.support)?;
        }
        writeln!(f)?;
        writeln!(f, "  {:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.macro_avg.support)?;
        for c in [&self.macro_avg, &self.weighted_avg] {
            writeln!(f, "  {:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", c.label, c.precision, c.recall, c.f1, c.support)?;
        }

        writeln!(f)?;
        write!(f, "  {:>14}", "true \\ pred")?;
        for c in &self.classes {
            write!(f, " {:>8}", c.label)?;
        }
        writeln!(f)?;
        for (c, row) in self.classes.iter().zip(&self.confusion) {
            write!(f, "  {:>14}", c.label)?;
            for n in row {
                write!(f, " {:>8}", n)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["High".into(), "Low".into(), "Medium".into()]
    }

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 1, 2, 2, 1];
        let report = classification_report(&y, &y, &names());
        assert_eq!(report.accuracy, 1.0);
        assert!(report.classes.iter().all(|c| c.precision == 1.0 && c.recall == 1.0 && c.f1 == 1.0));
        assert_eq!(report.weighted_avg.support, 5);
    }

    #[test]
    fn test_mixed_predictions() {
        let y_true = vec![0, 0, 1, 1, 2, 2];
        let y_pred = vec![0, 1, 1, 1, 2, 0];
        let report = classification_report(&y_true, &y_pred, &names());

        let high = &report.classes[0];
        assert_eq!(high.support, 2);
        assert!((high.precision - 0.5).abs() < 1e-12);
        assert!((high.recall - 0.5).abs() < 1e-12);

        let low = &report.classes[1];
        assert!((low.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(low.recall, 1.0);
        assert!((low.f1 - 0.8).abs() < 1e-12);

        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(report.confusion[2], vec![1, 0, 1]);
    }

    #[test]
    fn test_class_never_predicted_scores_zero() {
        let report = classification_report(&[0, 2], &[0, 0], &names());
        let medium = &report.classes[2];
        assert_eq!(medium.precision, 0.0);
        assert_eq!(medium.recall, 0.0);
        assert_eq!(medium.f1, 0.0);
        assert_eq!(report.classes[1].support, 0);
    }
}
