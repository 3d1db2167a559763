//! Feature engineering: derived family features and categorical encoding.

pub mod encoding;

pub use encoding::{EncodedGroup, one_hot_drop_first, same_category, sorted_categories};

use crate::data::schema::{ColumnSchema, ColumnType};
use crate::data::table::{DataTable, cell_as_f64};
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use serde_json::Value;

pub const FAMILY_SIZE: &str = "FamilySize";
pub const IS_ALONE: &str = "IsAlone";

/// Columns the engineer cannot run without.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Sex", "Embarked", "SibSp", "Parch"];

/// Derives `FamilySize`/`IsAlone` and one-hot encodes the categorical columns.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    pub categorical: Vec<String>,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self {
            categorical: vec!["Sex".to_string(), "Embarked".to_string()],
        }
    }
}

impl FeatureEngineer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the feature table from a cleaned table.
    ///
    /// Column order: surviving input columns, then `FamilySize`, `IsAlone`,
    /// then the indicator groups in `categorical` order.
    pub fn apply(&self, table: &DataTable, log: &dyn PipelineLog) -> Result<DataTable, PipelineError> {
        table.schema.require_all(&REQUIRED_COLUMNS, Stage::Features)?;
        for column in &self.categorical {
            table.schema.require(column, Stage::Features)?;
        }

        let sibsp = integer_column(table, "SibSp")?;
        let parch = integer_column(table, "Parch")?;
        let family: Vec<i64> = sibsp.iter().zip(&parch).map(|(s, p)| s + p + 1).collect();

        let mut features = table.clone();
        features.push_column(
            ColumnSchema::new(FAMILY_SIZE, ColumnType::Integer, false),
            family.iter().map(|&f| Value::from(f)).collect(),
        );
        features.push_column(
            ColumnSchema::new(IS_ALONE, ColumnType::Integer, false),
            family.iter().map(|&f| Value::from(i64::from(f == 1))).collect(),
        );

        for column in &self.categorical {
            let group = one_hot_drop_first(&mut features, column, Stage::Features)?;
            log.debug(
                Stage::Features,
                &format!(
                    "{}: reference {:?}, indicators {:?}",
                    group.column, group.reference, group.indicators
                ),
            );
        }

        log.info(
            Stage::Features,
            &format!(
                "Feature engineering completed: {} columns",
                features.column_count()
            ),
        );
        Ok(features)
    }
}

/// Read a column of whole numbers, rejecting gaps and fractions.
fn integer_column(table: &DataTable, column: &str) -> Result<Vec<i64>, PipelineError> {
    let idx = table.schema.require(column, Stage::Features)?;
    table
        .column(idx)
        .enumerate()
        .map(|(row, cell)| match cell_as_f64(cell) {
            Some(v) if v.fract() == 0.0 => Ok(v as i64),
            Some(_) => Err(PipelineError::schema(
                Stage::Features,
                column,
                format!("row {row}: expected a whole number, found {cell}"),
            )),
            None => Err(PipelineError::schema(
                Stage::Features,
                column,
                format!("row {row}: expected a number, found {cell}"),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MemoryLog, NullLog};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[rustfmt::skip]
    fn cleaned() -> DataTable {
        DataTable::from_rows(
            &["Age", "Embarked", "Fare", "SibSp", "Parch", "Sex", "Pclass", "Survived"],
            vec![
                vec![json!(22.0), json!("S"), json!(7.25), json!(1), json!(0), json!("male"), json!(3), json!(0)],
                vec![json!(38.0), json!("C"), json!(71.28), json!(1), json!(0), json!("female"), json!(1), json!(1)],
                vec![json!(26.0), json!("Q"), json!(7.92), json!(0), json!(0), json!("female"), json!(3), json!(1)],
                vec![json!(35.0), json!("S"), json!(53.1), json!(1), json!(2), json!("male"), json!(1), json!(1)],
            ],
        )
    }

    #[test]
    fn test_feature_columns_and_order() {
        let features = FeatureEngineer::new().apply(&cleaned(), &NullLog).unwrap();
        assert_eq!(
            features.column_names(),
            vec![
                "Age", "Fare", "SibSp", "Parch", "Pclass", "Survived", "FamilySize", "IsAlone",
                "Sex_male", "Embarked_Q", "Embarked_S",
            ]
        );
    }

    #[test]
    fn test_family_size_and_is_alone() {
        let features = FeatureEngineer::new().apply(&cleaned(), &NullLog).unwrap();
        let family = features.column_index(FAMILY_SIZE).unwrap();
        let alone = features.column_index(IS_ALONE).unwrap();
        let sizes: Vec<&Value> = features.column(family).collect();
        let alone: Vec<&Value> = features.column(alone).collect();
        assert_eq!(sizes, vec![&json!(2), &json!(2), &json!(1), &json!(4)]);
        assert_eq!(alone, vec![&json!(0), &json!(0), &json!(1), &json!(0)]);
    }

    #[test]
    fn test_indicator_values() {
        let features = FeatureEngineer::new().apply(&cleaned(), &NullLog).unwrap();
        let sex = features.column_index("Sex_male").unwrap();
        let q = features.column_index("Embarked_Q").unwrap();
        let s = features.column_index("Embarked_S").unwrap();
        let row = |i: usize| {
            (
                features.rows[i][sex].clone(),
                features.rows[i][q].clone(),
                features.rows[i][s].clone(),
            )
        };
        assert_eq!(row(0), (json!(1), json!(0), json!(1)));
        assert_eq!(row(1), (json!(0), json!(0), json!(0)));
        assert_eq!(row(2), (json!(0), json!(1), json!(0)));
    }

    #[test]
    fn test_input_table_is_untouched() {
        let input = cleaned();
        let before = input.clone();
        FeatureEngineer::new().apply(&input, &NullLog).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_missing_required_column() {
        let table = cleaned().without_columns(&["Parch"], Stage::Features).unwrap();
        let err = FeatureEngineer::new().apply(&table, &NullLog).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, stage: Stage::Features, .. } if column == "Parch"));
    }

    #[test]
    fn test_missing_sibsp_value_is_schema_error() {
        let mut table = cleaned();
        table.rows[2][3] = Value::Null;
        let err = FeatureEngineer::new().apply(&table, &NullLog).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "SibSp"));
    }

    #[test]
    fn test_logs_completion() {
        let log = MemoryLog::new();
        FeatureEngineer::new().apply(&cleaned(), &log).unwrap();
        let messages = log.messages_for(Stage::Features);
        assert_eq!(
            messages.last().map(String::as_str),
            Some("Feature engineering completed: 11 columns")
        );
    }
}
