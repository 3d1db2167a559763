//! One-hot encoding with a dropped reference category.

use crate::data::schema::{ColumnSchema, ColumnType};
use crate::data::table::{DataTable, format_cell};
use crate::error::PipelineError;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Result of encoding one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedGroup {
    pub column: String,
    /// First category in sorted order; encoded as all zeros.
    pub reference: Option<String>,
    /// Indicator columns appended to the table, in category order.
    pub indicators: Vec<String>,
}

/// Category equality. Numbers compare by value, so `2` and `2.0` are one
/// category.
pub fn same_category(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Distinct present values of a column, sorted.
///
/// Values sort numerically when every one is a number, otherwise by their
/// text form. Each category keeps its first-seen spelling.
pub fn sorted_categories<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut distinct: Vec<Value> = Vec::new();
    for value in values.filter(|v| !v.is_null()) {
        if !distinct.iter().any(|d| same_category(d, value)) {
            distinct.push(value.clone());
        }
    }
    if distinct.iter().all(Value::is_number) {
        distinct.sort_by(|a, b| {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        distinct.sort_by_key(format_cell);
    }
    distinct
}

/// Replace `column` in an owned table with `k - 1` integer indicator columns
/// named `<column>_<value>`, appended at the end.
pub fn one_hot_drop_first(
    table: &mut DataTable,
    column: &str,
    stage: Stage,
) -> Result<EncodedGroup, PipelineError> {
    let idx = table.schema.require(column, stage)?;
    let categories = sorted_categories(table.column(idx));
    let (column_schema, values) = table.take_column(idx);

    let mut indicators = Vec::new();
    for category in categories.iter().skip(1) {
        let name = format!("{}_{}", column_schema.name, format_cell(category));
        if table.schema.contains(&name) {
            return Err(PipelineError::schema(
                stage,
                &name,
                format!("indicator for {column} collides with an existing column"),
            ));
        }
        let flags = values
            .iter()
            .map(|v| Value::from(i64::from(same_category(v, category))))
            .collect();
        table.push_column(ColumnSchema::new(&name, ColumnType::Integer, false), flags);
        indicators.push(name);
    }

    Ok(EncodedGroup {
        column: column_schema.name,
        reference: categories.first().map(format_cell),
        indicators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn embarked() -> DataTable {
        DataTable::from_rows(
            &["Fare", "Embarked"],
            vec![
                vec![json!(7.25), json!("S")],
                vec![json!(71.28), json!("C")],
                vec![json!(8.05), json!("Q")],
                vec![json!(8.46), Value::Null],
                vec![json!(53.1), json!("S")],
            ],
        )
    }

    #[test]
    fn test_sorted_categories_text() {
        let table = embarked();
        let cats = sorted_categories(table.column(1));
        assert_eq!(cats, vec![json!("C"), json!("Q"), json!("S")]);
    }

    #[test]
    fn test_sorted_categories_numeric() {
        let values = [json!(10), json!(2), json!(2), json!(1.5)];
        assert_eq!(
            sorted_categories(values.iter()),
            vec![json!(1.5), json!(2), json!(10)]
        );
    }

    #[test]
    fn test_integer_and_float_spellings_are_one_category() {
        let values = [json!(2), json!(3.0), json!(2.0), json!(3)];
        assert_eq!(sorted_categories(values.iter()), vec![json!(2), json!(3.0)]);

        let mut table = DataTable::from_rows(
            &["Deck"],
            values.iter().map(|v| vec![v.clone()]).collect(),
        );
        let group = one_hot_drop_first(&mut table, "Deck", Stage::Features).unwrap();
        assert_eq!(group.indicators, vec!["Deck_3.0"]);
        let flags: Vec<&Value> = table.column(0).collect();
        assert_eq!(flags, vec![&json!(0), &json!(1), &json!(0), &json!(1)]);
    }

    #[test]
    fn test_one_hot_drops_reference() {
        let mut table = embarked();
        let group = one_hot_drop_first(&mut table, "Embarked", Stage::Features).unwrap();

        assert_eq!(group.reference.as_deref(), Some("C"));
        assert_eq!(group.indicators, vec!["Embarked_Q", "Embarked_S"]);
        assert_eq!(table.column_names(), vec!["Fare", "Embarked_Q", "Embarked_S"]);
        assert_eq!(table.rows[0][1..], [json!(0), json!(1)]);
        // reference category and missing values encode as all zeros
        assert_eq!(table.rows[1][1..], [json!(0), json!(0)]);
        assert_eq!(table.rows[3][1..], [json!(0), json!(0)]);
        assert_eq!(table.rows[2][1..], [json!(1), json!(0)]);
    }

    #[test]
    fn test_single_category_yields_no_indicators() {
        let mut table = DataTable::from_rows(&["Sex"], vec![vec![json!("male")], vec![json!("male")]]);
        let group = one_hot_drop_first(&mut table, "Sex", Stage::Features).unwrap();
        assert!(group.indicators.is_empty());
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_collision_is_schema_error() {
        let mut table = DataTable::from_rows(
            &["Sex", "Sex_male"],
            vec![vec![json!("female"), json!(0)], vec![json!("male"), json!(1)]],
        );
        let err = one_hot_drop_first(&mut table, "Sex", Stage::Features).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "Sex_male"));
    }
}
