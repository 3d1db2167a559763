//! Reproducible train/test split.

use crate::data::table::DataTable;
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use manifest_core::SplitConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Value;

/// Train and test partitions with the target separated out.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    pub target_column: String,
    pub x_train: DataTable,
    pub x_test: DataTable,
    pub y_train: Vec<Value>,
    pub y_test: Vec<Value>,
    /// Row of the input table each training row came from.
    pub train_indices: Vec<usize>,
    /// Row of the input table each test row came from.
    pub test_indices: Vec<usize>,
}

/// Rows that land in the test partition: `N * p` rounded half to even.
pub fn test_row_count(n_rows: usize, test_size: f64) -> usize {
    (n_rows as f64 * test_size).round_ties_even() as usize
}

/// Seeded permutation split.
#[derive(Debug, Clone)]
pub struct Splitter {
    pub target_column: String,
    pub test_size: f64,
    pub seed: u64,
}

impl Splitter {
    pub fn new(target_column: impl Into<String>, test_size: f64, seed: u64) -> Self {
        Self {
            target_column: target_column.into(),
            test_size,
            seed,
        }
    }

    /// Reject a test fraction outside `(0, 1)`.
    pub fn check(&self) -> Result<(), PipelineError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::validation(
                Stage::Split,
                format!("test_size must be in (0, 1), got {}", self.test_size),
            ));
        }
        Ok(())
    }

    pub fn split(&self, table: &DataTable, log: &dyn PipelineLog) -> Result<SplitData, PipelineError> {
        self.check()?;
        let target_idx = table.column_index(&self.target_column).ok_or_else(|| {
            PipelineError::validation(
                Stage::Split,
                format!("target column '{}' is not in the table", self.target_column),
            )
        })?;

        let n_rows = table.row_count();
        let n_test = test_row_count(n_rows, self.test_size);
        if n_test == 0 || n_test >= n_rows {
            return Err(PipelineError::validation(
                Stage::Split,
                format!(
                    "test_size {} on {n_rows} rows leaves {n_test} test and {} train rows; both must be non-empty",
                    self.test_size,
                    n_rows.saturating_sub(n_test)
                ),
            ));
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);
        let (test_indices, train_indices) = order.split_at(n_test);

        let mut features = table.clone();
        let (_, target) = features.take_column(target_idx);
        let pick = |indices: &[usize]| -> Vec<Value> {
            indices.iter().map(|&i| target[i].clone()).collect()
        };

        let split = SplitData {
            target_column: self.target_column.clone(),
            x_train: features.select_rows(train_indices),
            x_test: features.select_rows(test_indices),
            y_train: pick(train_indices),
            y_test: pick(test_indices),
            train_indices: train_indices.to_vec(),
            test_indices: test_indices.to_vec(),
        };
        log.info(
            Stage::Split,
            &format!(
                "Data split: {} training samples, {} testing samples",
                split.train_indices.len(),
                split.test_indices.len()
            ),
        );
        Ok(split)
    }
}

impl From<&SplitConfig> for Splitter {
    fn from(config: &SplitConfig) -> Self {
        Self::new(&config.target_column, config.test_size, config.seed)
    }
}
