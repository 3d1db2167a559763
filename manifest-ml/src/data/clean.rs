//! Cleaner: drop non-predictive columns and impute missing values.

use crate::data::table::{DataTable, cell_as_f64, float_cell};
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns that identify a passenger but carry no signal.
pub const DROPPED_COLUMNS: [&str; 4] = ["PassengerId", "Name", "Ticket", "Cabin"];

/// Numeric columns imputed with their median.
pub const MEDIAN_COLUMNS: [&str; 2] = ["Age", "Fare"];

/// Categorical columns imputed with their mode.
pub const MODE_COLUMNS: [&str; 1] = ["Embarked"];

/// Statistic used to fill a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Median,
    MostFrequent,
}

/// One column's imputation, as applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub column: String,
    pub strategy: ImputeStrategy,
    pub value: Value,
    pub filled: usize,
}

/// Drops identifier columns and fills gaps in `Age`, `Fare` and `Embarked`.
///
/// Statistics are computed once per column over the whole table handed in.
/// When cleaning runs before the train/test split, as in the default
/// pipeline, test rows contribute to the medians and mode.
#[derive(Debug, Clone)]
pub struct Cleaner {
    pub drop: Vec<String>,
    pub impute: Vec<(String, ImputeStrategy)>,
}

impl Default for Cleaner {
    fn default() -> Self {
        let impute = MEDIAN_COLUMNS
            .iter()
            .map(|c| (c.to_string(), ImputeStrategy::Median))
            .chain(
                MODE_COLUMNS
                    .iter()
                    .map(|c| (c.to_string(), ImputeStrategy::MostFrequent)),
            )
            .collect();
        Self {
            drop: DROPPED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            impute,
        }
    }
}

impl Cleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the cleaned copy of `table`.
    pub fn apply(&self, table: &DataTable, log: &dyn PipelineLog) -> Result<DataTable, PipelineError> {
        for (column, _) in &self.impute {
            table.schema.require(column, Stage::Clean)?;
        }
        let drop: Vec<&str> = self.drop.iter().map(String::as_str).collect();
        let mut cleaned = table.without_columns(&drop, Stage::Clean)?;

        for (column, strategy) in &self.impute {
            let imputation = impute_column(&mut cleaned, column, *strategy)?;
            log.info(
                Stage::Clean,
                &format!(
                    "{}: filled {} missing value(s) with {:?} {}",
                    imputation.column,
                    imputation.filled,
                    imputation.strategy,
                    imputation.value
                ),
            );
        }

        log.info(Stage::Clean, "Data cleaning complete");
        Ok(cleaned)
    }
}

/// Fill the missing cells of one column of an owned table.
pub fn impute_column(
    table: &mut DataTable,
    column: &str,
    strategy: ImputeStrategy,
) -> Result<Imputation, PipelineError> {
    let idx = table.schema.require(column, Stage::Clean)?;
    let value = match strategy {
        ImputeStrategy::Median => {
            let mut values = Vec::new();
            for (row, cell) in table.column(idx).enumerate() {
                if cell.is_null() {
                    continue;
                }
                let v = cell_as_f64(cell).ok_or_else(|| {
                    PipelineError::schema(
                        Stage::Clean,
                        column,
                        format!("row {row}: expected a number, found {cell}"),
                    )
                })?;
                values.push(v);
            }
            let median = median(&mut values).ok_or_else(|| {
                PipelineError::validation(Stage::Clean, format!("{column}: no values to take a median of"))
            })?;
            float_cell(median)
        }
        ImputeStrategy::MostFrequent => most_frequent(table.column(idx)).ok_or_else(|| {
            PipelineError::validation(Stage::Clean, format!("{column}: no values to take a mode of"))
        })?,
    };

    let mut filled = 0;
    for row in &mut table.rows {
        if row[idx].is_null() {
            row[idx] = value.clone();
            filled += 1;
        }
    }
    if filled > 0 {
        table.refresh_column(idx);
    }

    Ok(Imputation {
        column: column.to_string(),
        strategy,
        value,
        filled,
    })
}

/// Median; even counts average the two middle values.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    })
}

/// Most frequent present value; ties go to the value seen first.
pub fn most_frequent<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: Vec<(&Value, usize)> = Vec::new();
    for value in values.filter(|v| !v.is_null()) {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    // max_by_key keeps the last maximum, so scan in reverse to keep the first
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, n)| *n)
        .map(|(v, _)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MemoryLog, NullLog};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[rustfmt::skip]
    fn raw() -> DataTable {
        let cols = [
            "PassengerId", "Name", "Ticket", "Cabin", "Age", "Embarked", "Fare", "SibSp", "Parch",
            "Sex", "Pclass", "Survived",
        ];
        let rows = vec![
            vec![json!(1), json!("A"), json!("T1"), Value::Null, json!(22.0), json!("S"), json!(7.25), json!(1), json!(0), json!("male"), json!(3), json!(0)],
            vec![json!(2), json!("B"), json!("T2"), json!("C85"), json!(38.0), json!("C"), json!(71.28), json!(1), json!(0), json!("female"), json!(1), json!(1)],
            vec![json!(3), json!("C"), json!("T3"), Value::Null, Value::Null, Value::Null, json!(7.92), json!(0), json!(0), json!("female"), json!(3), json!(1)],
            vec![json!(4), json!("D"), json!("T4"), json!("C123"), json!(35.0), json!("S"), Value::Null, json!(1), json!(0), json!("female"), json!(1), json!(1)],
        ];
        DataTable::from_rows(&cols, rows)
    }

    #[test]
    fn test_clean_drops_and_imputes() {
        let cleaned = Cleaner::new().apply(&raw(), &NullLog).unwrap();
        assert_eq!(
            cleaned.column_names(),
            vec!["Age", "Embarked", "Fare", "SibSp", "Parch", "Sex", "Pclass", "Survived"]
        );
        for name in ["Age", "Fare", "Embarked"] {
            let idx = cleaned.column_index(name).unwrap();
            assert_eq!(cleaned.null_count(idx), 0, "{name} still has gaps");
            assert!(!cleaned.schema.columns[idx].nullable);
        }
        // Age median of 22, 35, 38
        assert_eq!(cleaned.rows[2][0], json!(35.0));
        // Fare median of 7.25, 7.92, 71.28
        assert_eq!(cleaned.rows[3][2], json!(7.92));
        assert_eq!(cleaned.rows[2][1], json!("S"));
    }

    #[test]
    fn test_clean_does_not_touch_input() {
        let input = raw();
        let before = input.clone();
        let _ = Cleaner::new().apply(&input, &NullLog).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_constant_age_imputes_that_constant() {
        let mut table = raw();
        let age = table.column_index("Age").unwrap();
        for row in &mut table.rows {
            row[age] = json!(30.0);
        }
        table.rows[1][age] = Value::Null;
        let cleaned = Cleaner::new().apply(&table, &NullLog).unwrap();
        assert_eq!(cleaned.rows[1][0], json!(30.0));
    }

    #[test]
    fn test_missing_droppable_column_is_schema_error() {
        let table = raw().without_columns(&["Cabin"], Stage::Clean).unwrap();
        let err = Cleaner::new().apply(&table, &NullLog).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, stage: Stage::Clean, .. } if column == "Cabin"));
    }

    #[test]
    fn test_missing_imputable_column_is_schema_error() {
        let table = raw().without_columns(&["Fare"], Stage::Clean).unwrap();
        let err = Cleaner::new().apply(&table, &NullLog).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "Fare"));
    }

    #[test]
    fn test_all_missing_column_is_validation_error() {
        let mut table = raw();
        let fare = table.column_index("Fare").unwrap();
        for row in &mut table.rows {
            row[fare] = Value::Null;
        }
        let err = Cleaner::new().apply(&table, &NullLog).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[test]
    fn test_clean_logs_each_imputation() {
        let log = MemoryLog::new();
        Cleaner::new().apply(&raw(), &log).unwrap();
        let messages = log.messages_for(Stage::Clean);
        assert_eq!(messages.len(), 4);
        assert!(messages[0].starts_with("Age: filled 1 missing value(s)"));
        assert!(messages[2].starts_with("Embarked: filled 1"));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_mode_tie_keeps_first_seen() {
        let values = [json!("Q"), json!("C"), Value::Null, json!("C"), json!("Q")];
        assert_eq!(most_frequent(values.iter()), Some(json!("Q")));
        let values = [json!("S"), json!("C"), json!("C")];
        assert_eq!(most_frequent(values.iter()), Some(json!("C")));
        assert_eq!(most_frequent([Value::Null].iter()), None);
    }
}
