//! Random forest classifier: bagged CART trees with majority voting.

use crate::data::table::{DataTable, cell_as_f64, format_cell};
use crate::error::PipelineError;
use crate::features::{same_category, sorted_categories};
use crate::log::PipelineLog;
use crate::stage::Stage;
use crate::training::tree::{DecisionTree, TrainingSet, TreeParams, bootstrap, majority};
use manifest_core::ForestConfig;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fitted forest bound to the feature columns it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Feature columns in fit order; prediction input is aligned to this.
    pub feature_columns: Vec<String>,
    /// Sorted class labels; trees predict indices into this list.
    pub classes: Vec<Value>,
    pub trees: Vec<DecisionTree>,
    /// Mean decrease in impurity per feature column, summing to 1.
    pub feature_importances: Vec<f64>,
    /// Candidate features per split after resolving `max_features`.
    pub max_features: usize,
}

impl RandomForestModel {
    pub fn n_features(&self) -> usize {
        self.feature_columns.len()
    }

    /// Reorder `table` into fit order by column name.
    ///
    /// The column sets must match exactly; the first missing or unexpected
    /// column is reported as a schema error.
    pub fn align(&self, table: &DataTable, stage: Stage) -> Result<DataTable, PipelineError> {
        reject_duplicate_columns(table, stage)?;
        let mut indices = Vec::with_capacity(self.feature_columns.len());
        for name in &self.feature_columns {
            let idx = table.column_index(name).ok_or_else(|| {
                PipelineError::schema(stage, name, "feature column seen at fit time is missing")
            })?;
            indices.push(idx);
        }
        if let Some(extra) = table
            .column_names()
            .into_iter()
            .find(|name| !self.feature_columns.iter().any(|f| f == name))
        {
            return Err(PipelineError::schema(
                stage,
                extra,
                "column was not seen at fit time",
            ));
        }
        Ok(table.select_columns(&indices))
    }

    /// Predict a label per row of `table`, aligning its columns first.
    pub fn predict(&self, table: &DataTable) -> Result<Vec<Value>, PipelineError> {
        let aligned = self.align(table, Stage::Evaluate)?;
        let x = feature_matrix(&aligned, Stage::Evaluate)?;
        Ok(self
            .predict_matrix(&x)
            .into_iter()
            .map(|class| self.classes[class].clone())
            .collect())
    }

    /// Class index per row of an already-aligned matrix.
    pub fn predict_matrix(&self, x: &[Vec<f64>]) -> Vec<usize> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    fn predict_row(&self, row: &[f64]) -> usize {
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict_row(row)] += 1;
        }
        majority(&votes)
    }
}

/// Fits [`RandomForestModel`]s from forest hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    pub config: ForestConfig,
}

impl Trainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn fit(
        &self,
        x_train: &DataTable,
        y_train: &[Value],
        log: &dyn PipelineLog,
    ) -> Result<RandomForestModel, PipelineError> {
        if x_train.row_count() == 0 {
            return Err(PipelineError::training("training partition is empty"));
        }
        if x_train.column_count() == 0 {
            return Err(PipelineError::training("training partition has no feature columns"));
        }
        if y_train.len() != x_train.row_count() {
            return Err(PipelineError::validation(
                Stage::Train,
                format!(
                    "{} target values for {} training rows",
                    y_train.len(),
                    x_train.row_count()
                ),
            ));
        }
        if self.config.n_estimators == 0 {
            return Err(PipelineError::training("n_estimators must be at least 1"));
        }
        reject_duplicate_columns(x_train, Stage::Train)?;

        let x = feature_matrix(x_train, Stage::Train)?;
        if let Some(row) = y_train.iter().position(Value::is_null) {
            return Err(PipelineError::validation(
                Stage::Train,
                format!("missing target value at row {row}"),
            ));
        }
        let classes = sorted_categories(y_train.iter());
        if classes.len() < 2 {
            return Err(PipelineError::training(format!(
                "target needs at least two distinct classes, found {}",
                classes.len()
            )));
        }
        let y: Vec<usize> = y_train
            .iter()
            .map(|label| classes.iter().position(|c| same_category(c, label)).unwrap_or(0))
            .collect();

        let n_features = x_train.column_count();
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split.max(2),
            max_features: self.config.max_features.resolve(n_features),
        };
        let data = TrainingSet {
            x: &x,
            y: &y,
            n_classes: classes.len(),
        };

        let mut master = StdRng::seed_from_u64(self.config.seed);
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut importances = vec![0.0; n_features];
        for _ in 0..self.config.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.next_u64());
            let sample = bootstrap(x.len(), &mut rng);
            let (tree, tree_importances) = DecisionTree::fit(data, sample, params, &mut rng);
            for (total, v) in importances.iter_mut().zip(&tree_importances) {
                *total += v;
            }
            trees.push(tree);
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }

        log.info(
            Stage::Train,
            &format!(
                "Model training completed: {} trees on {} samples x {} features, classes [{}]",
                trees.len(),
                x.len(),
                n_features,
                classes.iter().map(format_cell).collect::<Vec<_>>().join(", ")
            ),
        );

        Ok(RandomForestModel {
            feature_columns: x_train.column_names().iter().map(|s| s.to_string()).collect(),
            classes,
            trees,
            feature_importances: importances,
            max_features: params.max_features,
        })
    }
}

/// Columns are matched by name, so every name must be unique.
fn reject_duplicate_columns(table: &DataTable, stage: Stage) -> Result<(), PipelineError> {
    match table.schema.first_duplicate() {
        Some(name) => Err(PipelineError::schema(
            stage,
            name,
            "feature column appears more than once",
        )),
        None => Ok(()),
    }
}

/// Numeric matrix of a table; missing or non-numeric cells are rejected.
pub fn feature_matrix(table: &DataTable, stage: Stage) -> Result<Vec<Vec<f64>>, PipelineError> {
    let names = table.column_names();
    table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, cell)| {
                    cell_as_f64(cell).ok_or_else(|| {
                        let what = if cell.is_null() { "missing" } else { "non-numeric" };
                        PipelineError::validation(
                            stage,
                            format!("{what} value {cell} in column '{}' at row {r}", names[c]),
                        )
                    })
                })
                .collect()
        })
        .collect()
}
