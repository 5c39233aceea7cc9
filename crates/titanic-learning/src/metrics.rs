//! Classification metrics.
//!
//! [`ClassificationReport`] holds per-class precision, recall, F1 and support
//! along with accuracy and the macro and weighted averages. Its `Display`
//! renders the familiar tabular text report.

use crate::error::{LearningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for one class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true instances of the label.
    pub support: usize,
}

/// Precision, recall and F1 averaged over classes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Evaluation of predicted labels against true labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One entry per label seen in either input, ascending.
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    /// Total number of samples.
    pub support: usize,
}

/// Ratio that is zero when the denominator is zero.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Compare `predicted` with `actual`.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`] if the inputs are empty or differ
    /// in length.
    pub fn new(actual: &[i64], predicted: &[i64]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(LearningError::InvalidData(format!(
                "{} true labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(LearningError::InvalidData(
                "cannot evaluate zero samples".to_string(),
            ));
        }

        let mut labels: Vec<i64> = actual.iter().chain(predicted).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|&label| {
                let true_positive = actual
                    .iter()
                    .zip(predicted)
                    .filter(|(a, p)| **a == label && **p == label)
                    .count();
                let predicted_positive = predicted.iter().filter(|p| **p == label).count();
                let support = actual.iter().filter(|a| **a == label).count();

                let precision = ratio(true_positive, predicted_positive);
                let recall = ratio(true_positive, support);
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1_score: f1(precision, recall),
                    support,
                }
            })
            .collect();

        let total = actual.len();
        let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();

        let n_classes = classes.len() as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
        };
        let weight = |c: &ClassMetrics| c.support as f64 / total as f64;
        let weighted_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1_score: classes.iter().map(|c| c.f1_score * weight(c)).sum(),
        };

        Ok(Self {
            classes,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
            support: total,
        })
    }

    /// Metrics of a single label, if it was seen.
    pub fn class(&self, label: i64) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

const NAME_WIDTH: usize = 12;

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            w = NAME_WIDTH
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.label,
                class.precision,
                class.recall,
                class.f1_score,
                class.support,
                w = NAME_WIDTH
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support,
            w = NAME_WIDTH
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name,
                avg.precision,
                avg.recall,
                avg.f1_score,
                self.support,
                w = NAME_WIDTH
            )?;
        }
        Ok(())
    }
}
