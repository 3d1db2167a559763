//! Data quality profiling.

use crate::data::table::DataTable;
use serde::{Deserialize, Serialize};

/// Missing-value profile of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNulls {
    pub column: String,
    pub null_count: usize,
    pub null_percentage: f64,
}

/// A data quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Per-column missing values, in schema order.
    pub nulls: Vec<ColumnNulls>,
    pub duplicate_rows: usize,
}

impl DataQualityReport {
    /// Columns that still contain missing values.
    pub fn columns_with_missing(&self) -> Vec<&str> {
        self.nulls
            .iter()
            .filter(|c| c.null_count > 0)
            .map(|c| c.column.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.nulls.iter().all(|c| c.null_count == 0)
    }

    /// One-line summary for logs, e.g. `Age=3 (3.0%), Embarked=1 (1.0%)`.
    pub fn missing_summary(&self) -> String {
        let parts: Vec<String> = self
            .nulls
            .iter()
            .filter(|c| c.null_count > 0)
            .map(|c| format!("{}={} ({:.1}%)", c.column, c.null_count, c.null_percentage))
            .collect();
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Profile a table.
pub fn profile(table: &DataTable) -> DataQualityReport {
    let total_rows = table.row_count();
    let nulls = table
        .schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let null_count = table.null_count(i);
            let null_percentage = if total_rows > 0 {
                null_count as f64 / total_rows as f64 * 100.0
            } else {
                0.0
            };
            ColumnNulls {
                column: col.name.clone(),
                null_count,
                null_percentage,
            }
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    let mut duplicate_rows = 0;
    for row in &table.rows {
        let key = serde_json::to_string(row).unwrap_or_default();
        if !seen.insert(key) {
            duplicate_rows += 1;
        }
    }

    DataQualityReport {
        total_rows,
        total_columns: table.column_count(),
        nulls,
        duplicate_rows,
    }
}
