//! In-memory record table: a schema plus aligned rows of JSON scalars.

use crate::data::schema::{ColumnSchema, SchemaDefinition};
use crate::error::PipelineError;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A table of rows, each aligned with the schema's column order.
///
/// Missing values are `Value::Null`. Stage operations borrow a table and
/// return a new one; nothing here mutates a table the caller still owns
/// except the explicit builder-style methods on an owned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub schema: SchemaDefinition,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(schema: SchemaDefinition, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == schema.len()));
        Self { schema, rows }
    }

    /// Build a table from column names and rows, inferring each column's type.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let schema = SchemaDefinition::new(
            columns
                .iter()
                .enumerate()
                .map(|(i, name)| ColumnSchema::infer(*name, rows.iter().map(|r| &r[i])))
                .collect(),
        );
        Self::new(schema, rows)
    }

    pub fn empty(schema: SchemaDefinition) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Values of a named column.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&Value>> {
        self.column_index(name).map(|idx| self.column(idx).collect())
    }

    pub fn null_count(&self, idx: usize) -> usize {
        self.column(idx).filter(|v| v.is_null()).count()
    }

    /// Recompute a column's type and nullability from its current values.
    pub fn refresh_column(&mut self, idx: usize) {
        let name = self.schema.columns[idx].name.clone();
        let refreshed = ColumnSchema::infer(name, self.rows.iter().map(|r| &r[idx]));
        self.schema.columns[idx] = refreshed;
    }

    /// Copy of the table without the named columns.
    pub fn without_columns(&self, names: &[&str], stage: Stage) -> Result<DataTable, PipelineError> {
        let drop = self.schema.require_all(names, stage)?;
        let keep: Vec<usize> = (0..self.column_count())
            .filter(|i| !drop.contains(i))
            .collect();
        Ok(self.select_columns(&keep))
    }

    /// Copy of the table with only the given column indices, in that order.
    pub fn select_columns(&self, indices: &[usize]) -> DataTable {
        let schema = SchemaDefinition::new(
            indices
                .iter()
                .map(|&i| self.schema.columns[i].clone())
                .collect(),
        );
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        DataTable { schema, rows }
    }

    /// Copy of the table with only the given row indices, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> DataTable {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let mut table = DataTable {
            schema: self.schema.clone(),
            rows,
        };
        for idx in 0..table.column_count() {
            table.refresh_column(idx);
        }
        table
    }

    /// Append a column to an owned table.
    pub fn push_column(&mut self, column: ColumnSchema, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.schema.columns.push(column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Remove a column from an owned table, returning its values.
    pub fn take_column(&mut self, idx: usize) -> (ColumnSchema, Vec<Value>) {
        let column = self.schema.columns.remove(idx);
        let values = self.rows.iter_mut().map(|row| row.remove(idx)).collect();
        (column, values)
    }
}

/// Numeric view of a cell; booleans count as 0/1.
pub fn cell_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Float cell, falling back to a string for non-finite values.
pub fn float_cell(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

/// Text form of a cell as it appears in a delimited file.
///
/// Integral floats keep a trailing `.0` so they reload as floats; missing
/// values are empty.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnType;
    use serde_json::json;

    fn sample() -> DataTable {
        DataTable::from_rows(
            &["PassengerId", "Age", "Sex"],
            vec![
                vec![json!(1), json!(22.0), json!("male")],
                vec![json!(2), Value::Null, json!("female")],
                vec![json!(3), json!(26.5), json!("female")],
            ],
        )
    }

    #[test]
    fn test_from_rows_infers_schema() {
        let table = sample();
        assert_eq!(table.column_names(), vec!["PassengerId", "Age", "Sex"]);
        assert_eq!(table.schema.columns[0].dtype, ColumnType::Integer);
        assert_eq!(table.schema.columns[1].dtype, ColumnType::Float);
        assert!(table.schema.columns[1].nullable);
        assert_eq!(table.schema.columns[2].dtype, ColumnType::String);
        assert_eq!(table.null_count(1), 1);
    }

    #[test]
    fn test_without_columns_is_copy() {
        let table = sample();
        let dropped = table.without_columns(&["PassengerId"], Stage::Clean).unwrap();
        assert_eq!(dropped.column_names(), vec!["Age", "Sex"]);
        assert_eq!(dropped.rows[0], vec![json!(22.0), json!("male")]);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_without_missing_column_fails() {
        let err = sample().without_columns(&["Cabin"], Stage::Clean).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "Cabin"));
    }

    #[test]
    fn test_select_rows_refreshes_nullability() {
        let subset = sample().select_rows(&[2, 0]);
        assert_eq!(subset.rows[0][0], json!(3));
        assert!(!subset.schema.columns[1].nullable);
    }

    #[test]
    fn test_take_and_push_column() {
        let mut table = sample();
        let (col, values) = table.take_column(0);
        assert_eq!(col.name, "PassengerId");
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
        table.push_column(col, values);
        assert_eq!(table.column_names(), vec!["Age", "Sex", "PassengerId"]);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!(3)), "3");
        assert_eq!(format_cell(&json!(28.0)), "28.0");
        assert_eq!(format_cell(&json!(7.25)), "7.25");
        assert_eq!(format_cell(&json!(true)), "true");
        assert_eq!(format_cell(&Value::Null), "");
        assert_eq!(format_cell(&json!("S")), "S");
    }

    #[test]
    fn test_cell_as_f64() {
        assert_eq!(cell_as_f64(&json!(2)), Some(2.0));
        assert_eq!(cell_as_f64(&json!(false)), Some(0.0));
        assert_eq!(cell_as_f64(&json!("x")), None);
        assert_eq!(cell_as_f64(&Value::Null), None);
    }
}
