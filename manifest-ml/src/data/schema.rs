//! Schema descriptors and type inference for tables.

use crate::error::PipelineError;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
    /// Every value in the column is missing.
    Null,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Boolean)
    }
}

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: ColumnType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, dtype: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullable,
        }
    }

    /// Describe a column from its values.
    pub fn infer<'a>(name: impl Into<String>, values: impl IntoIterator<Item = &'a serde_json::Value>) -> Self {
        let values: Vec<&serde_json::Value> = values.into_iter().collect();
        Self {
            name: name.into(),
            dtype: infer_column_type(values.iter().copied()),
            nullable: values.iter().any(|v| v.is_null()),
        }
    }
}

/// Ordered schema definition for a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub columns: Vec<ColumnSchema>,
}

impl SchemaDefinition {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// First column name that appears more than once.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// Index of a column the stage cannot run without.
    pub fn require(&self, name: &str, stage: Stage) -> Result<usize, PipelineError> {
        self.index_of(name)
            .ok_or_else(|| PipelineError::missing_column(stage, name))
    }

    /// Check several required columns at once, failing on the first absent one.
    pub fn require_all(&self, names: &[&str], stage: Stage) -> Result<Vec<usize>, PipelineError> {
        names.iter().map(|name| self.require(name, stage)).collect()
    }
}

/// Infer column type from a sample of values.
///
/// Strings dominate, then floats, then integers, then booleans. A column with
/// no present value is `Null`.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a serde_json::Value>) -> ColumnType {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_bool = false;
    let mut has_string = false;

    for v in values {
        match v {
            serde_json::Value::Number(n) => {
                if n.is_f64() {
                    has_float = true;
                } else {
                    has_int = true;
                }
            }
            serde_json::Value::Bool(_) => has_bool = true,
            serde_json::Value::String(_) => has_string = true,
            _ => {}
        }
    }

    if has_string {
        return ColumnType::String;
    }
    if has_float {
        return ColumnType::Float;
    }
    if has_int {
        return ColumnType::Integer;
    }
    if has_bool {
        return ColumnType::Boolean;
    }
    ColumnType::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_column_type_int() {
        let values = [json!(1), json!(2), serde_json::Value::Null];
        assert_eq!(infer_column_type(&values), ColumnType::Integer);
    }

    #[test]
    fn test_infer_column_type_float_wins_over_int() {
        let values = [json!(1), json!(2.5)];
        assert_eq!(infer_column_type(&values), ColumnType::Float);
    }

    #[test]
    fn test_infer_column_type_string() {
        let values = [json!("S"), json!("C")];
        assert_eq!(infer_column_type(&values), ColumnType::String);
    }

    #[test]
    fn test_infer_all_null() {
        let values = [serde_json::Value::Null];
        assert_eq!(infer_column_type(&values), ColumnType::Null);
    }

    #[test]
    fn test_column_schema_infer_nullable() {
        let values = [json!(22.0), serde_json::Value::Null];
        let col = ColumnSchema::infer("Age", &values);
        assert_eq!(col.dtype, ColumnType::Float);
        assert!(col.nullable);
    }

    #[test]
    fn test_require_all_reports_first_missing() {
        let schema = SchemaDefinition::new(vec![
            ColumnSchema::new("Sex", ColumnType::String, false),
            ColumnSchema::new("SibSp", ColumnType::Integer, false),
        ]);
        let err = schema
            .require_all(&["Sex", "Parch", "Embarked"], Stage::Features)
            .unwrap_err();
        match err {
            PipelineError::Schema { column, stage, .. } => {
                assert_eq!(column, "Parch");
                assert_eq!(stage, Stage::Features);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(schema.require_all(&["SibSp", "Sex"], Stage::Features).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_first_duplicate() {
        let schema = SchemaDefinition::new(vec![
            ColumnSchema::new("Fare", ColumnType::Float, false),
            ColumnSchema::new("Age", ColumnType::Float, false),
            ColumnSchema::new("Fare", ColumnType::Float, false),
        ]);
        assert_eq!(schema.first_duplicate(), Some("Fare"));
        let unique = SchemaDefinition::new(schema.columns[..2].to_vec());
        assert_eq!(unique.first_duplicate(), None);
    }
}
