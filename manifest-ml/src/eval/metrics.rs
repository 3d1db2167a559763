//! Classification metrics derived from a confusion matrix.

use crate::features::{same_category, sorted_categories};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counts of (actual, predicted) label pairs.
///
/// Rows are actual labels, columns predicted labels, both indexed by
/// `labels` (the sorted union of the two label sets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<Value>,
    pub counts: Vec<Vec<usize>>,
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Value,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged metrics across classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ConfusionMatrix {
    pub fn new(actual: &[Value], predicted: &[Value]) -> Self {
        let labels = sorted_categories(actual.iter().chain(predicted));
        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        let index = |v: &Value| labels.iter().position(|l| same_category(l, v));
        for (a, p) in actual.iter().zip(predicted) {
            if let (Some(a), Some(p)) = (index(a), index(p)) {
                counts[a][p] += 1;
            }
        }
        Self { labels, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Per-class metrics in label order. A zero denominator yields 0.
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.labels.len();
        (0..n)
            .map(|i| {
                let tp = self.counts[i][i];
                let support: usize = self.counts[i].iter().sum();
                let predicted: usize = (0..n).map(|r| self.counts[r][i]).sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                ClassMetrics {
                    label: self.labels[i].clone(),
                    precision,
                    recall,
                    f1: harmonic(precision, recall),
                    support,
                }
            })
            .collect()
    }
}

/// Unweighted mean over classes.
pub fn macro_average(classes: &[ClassMetrics]) -> AverageMetrics {
    let n = classes.len().max(1) as f64;
    AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        support: classes.iter().map(|c| c.support).sum(),
    }
}

/// Mean over classes weighted by support.
pub fn weighted_average(classes: &[ClassMetrics]) -> AverageMetrics {
    let support: usize = classes.iter().map(|c| c.support).sum();
    let weigh = |f: fn(&ClassMetrics) -> f64| {
        if support == 0 {
            0.0
        } else {
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / support as f64
        }
    };
    AverageMetrics {
        precision: weigh(|c| c.precision),
        recall: weigh(|c| c.recall),
        f1: weigh(|c| c.f1),
        support,
    }
}
