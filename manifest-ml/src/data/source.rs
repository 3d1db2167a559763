//! Loader: delimited files into typed tables.

use crate::data::schema::{ColumnSchema, ColumnType, SchemaDefinition};
use crate::data::table::{DataTable, float_cell};
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Delimited text file data source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    /// Read the whole file, inferring a type for every column.
    pub fn load(&self, log: &dyn PipelineLog) -> Result<DataTable, PipelineError> {
        if !self.path.exists() {
            return Err(PipelineError::data_load(&self.path, "file does not exist"));
        }
        let file = std::fs::File::open(&self.path)
            .map_err(|e| PipelineError::data_load(&self.path, e.to_string()))?;
        let table = read_delimited(file, self.delimiter, &self.path)?;
        log.info(
            Stage::Load,
            &format!(
                "Loaded data with {} rows and {} columns from {}",
                table.row_count(),
                table.column_count(),
                self.path.display()
            ),
        );
        Ok(table)
    }
}

/// Parse delimited text from any reader. `origin` only labels errors.
pub fn read_delimited<R: Read>(
    reader: R,
    delimiter: char,
    origin: &Path,
) -> Result<DataTable, PipelineError> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| PipelineError::data_load(origin, format!("delimiter {delimiter:?} is not ASCII")))?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::data_load(origin, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::data_load(origin, "missing header row"));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(PipelineError::data_load(
            origin,
            format!("column '{dup}' appears more than once in the header"),
        ));
    }

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| {
            PipelineError::data_load(origin, format!("record {}: {e}", line + 1))
        })?;
        // only empty cells are missing; text is kept verbatim
        raw.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }

    let dtypes: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_text_column(raw.iter().filter_map(|row| row[i].as_deref())))
        .collect();

    let rows: Vec<Vec<Value>> = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&dtypes)
                .map(|(cell, dtype)| cell.map_or(Value::Null, |c| typed_cell(&c, *dtype)))
                .collect()
        })
        .collect();

    let schema = SchemaDefinition::new(
        headers
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnSchema::new(name, dtypes[i], rows.iter().any(|r| r[i].is_null())))
            .collect(),
    );
    Ok(DataTable::new(schema, rows))
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_float(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Narrowest type every present cell fits.
fn infer_text_column<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    for cell in cells {
        let cell = cell.trim();
        seen = true;
        all_int &= cell.parse::<i64>().is_ok();
        all_float &= parse_float(cell).is_some();
        all_bool &= parse_bool(cell).is_some();
        if !(all_int || all_float || all_bool) {
            return ColumnType::String;
        }
    }
    match (seen, all_int, all_float, all_bool) {
        (false, ..) => ColumnType::Null,
        (true, true, _, _) => ColumnType::Integer,
        (true, _, true, _) => ColumnType::Float,
        (true, _, _, true) => ColumnType::Boolean,
        _ => ColumnType::String,
    }
}

/// Typed value of a present cell. Numbers and booleans parse from the
/// trimmed text; text cells keep their exact spelling.
fn typed_cell(cell: &str, dtype: ColumnType) -> Value {
    let trimmed = cell.trim();
    match dtype {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnType::Float => parse_float(trimmed)
            .map(float_cell)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnType::Boolean => parse_bool(trimmed)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnType::String | ColumnType::Null => Value::String(cell.to_string()),
    }
}
