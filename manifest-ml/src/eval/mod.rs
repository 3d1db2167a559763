//! Scoring a fitted model against held-out rows.

pub mod metrics;
pub mod report;

pub use metrics::{AverageMetrics, ClassMetrics, ConfusionMatrix, macro_average, weighted_average};
pub use report::{
    EvaluationReport, FeatureImportance, SAMPLE_PREDICTIONS, SamplePrediction, rank_importances,
};

use crate::data::table::DataTable;
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use crate::training::RandomForestModel;
use serde_json::Value;

/// Produces an [`EvaluationReport`] for a model on a test partition.
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub target_column: String,
}

impl Evaluator {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
        }
    }

    /// Score `model` on `x_test`/`y_test`.
    ///
    /// `x_test` must carry exactly the model's feature columns, in any
    /// order.
    pub fn evaluate(
        &self,
        model: &RandomForestModel,
        x_test: &DataTable,
        y_test: &[Value],
        log: &dyn PipelineLog,
    ) -> Result<EvaluationReport, PipelineError> {
        if x_test.row_count() == 0 {
            return Err(PipelineError::validation(Stage::Evaluate, "test partition is empty"));
        }
        if y_test.len() != x_test.row_count() {
            return Err(PipelineError::validation(
                Stage::Evaluate,
                format!(
                    "{} target values for {} test rows",
                    y_test.len(),
                    x_test.row_count()
                ),
            ));
        }
        if let Some(row) = y_test.iter().position(Value::is_null) {
            return Err(PipelineError::validation(
                Stage::Evaluate,
                format!("missing target value at row {row}"),
            ));
        }

        let predicted = model.predict(x_test)?;
        let confusion_matrix = ConfusionMatrix::new(y_test, &predicted);
        let classes = confusion_matrix.class_metrics();
        let report = EvaluationReport {
            target_column: self.target_column.clone(),
            test_samples: y_test.len(),
            accuracy: confusion_matrix.accuracy(),
            macro_avg: macro_average(&classes),
            weighted_avg: weighted_average(&classes),
            classes,
            confusion_matrix,
            feature_importance: rank_importances(&model.feature_columns, &model.feature_importances),
            sample_predictions: y_test
                .iter()
                .zip(&predicted)
                .take(SAMPLE_PREDICTIONS)
                .map(|(actual, predicted)| SamplePrediction {
                    actual: actual.clone(),
                    predicted: predicted.clone(),
                })
                .collect(),
        };

        log.info(Stage::Evaluate, &format!("Model accuracy: {:.4}", report.accuracy));
        for line in report.render().lines().filter(|l| !l.trim().is_empty()) {
            log.debug(Stage::Evaluate, line);
        }
        Ok(report)
    }
}
