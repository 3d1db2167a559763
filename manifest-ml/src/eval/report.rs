//! The evaluation report and its text rendering.

use crate::data::table::format_cell;
use crate::eval::metrics::{AverageMetrics, ClassMetrics, ConfusionMatrix};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

/// Sample predictions kept in a report.
pub const SAMPLE_PREDICTIONS: usize = 10;

/// Importance of one feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// One held-out row's true and predicted label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePrediction {
    pub actual: Value,
    pub predicted: Value,
}

/// Scores of a model on held-out data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub target_column: String,
    pub test_samples: usize,
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion_matrix: ConfusionMatrix,
    /// Descending by importance, ties in fit order.
    pub feature_importance: Vec<FeatureImportance>,
    pub sample_predictions: Vec<SamplePrediction>,
}

/// Rank feature columns by importance, highest first.
///
/// The sort is stable so equal importances keep fit order.
pub fn rank_importances(columns: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = columns
        .iter()
        .zip(importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

impl EvaluationReport {
    /// Classification report table followed by importances and samples.
    pub fn render(&self) -> String {
        let width = self
            .classes
            .iter()
            .map(|c| format_cell(&c.label).len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for class in &self.classes {
            let _ = writeln!(
                out,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                format_cell(&class.label),
                class.precision,
                class.recall,
                class.f1,
                class.support
            );
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.test_samples
        );
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            let _ = writeln!(
                out,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            );
        }

        if !self.feature_importance.is_empty() {
            out.push_str("\nFeature importance:\n");
            for item in &self.feature_importance {
                let _ = writeln!(out, "  {:<16} {:.4}", item.feature, item.importance);
            }
        }
        if !self.sample_predictions.is_empty() {
            out.push_str("\nSample predictions (actual -> predicted):\n");
            for sample in &self.sample_predictions {
                let _ = writeln!(
                    out,
                    "  {} -> {}",
                    format_cell(&sample.actual),
                    format_cell(&sample.predicted)
                );
            }
        }
        out
    }
}
