//! Persister: atomic writes of tables and JSON artifacts.

use crate::data::table::{DataTable, format_cell};
use crate::error::PipelineError;
use crate::eval::EvaluationReport;
use crate::log::PipelineLog;
use crate::stage::Stage;
use crate::training::ModelArtifact;
use manifest_core::persistence::{atomic_write_json, atomic_write_with};
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Write `table` as delimited text, header first, in its current column order.
///
/// Parent directories are created; the file appears only once fully written.
pub fn write_table(
    table: &DataTable,
    path: &Path,
    delimiter: char,
    log: &dyn PipelineLog,
) -> Result<(), PipelineError> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        PipelineError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "delimiter is not ASCII"),
        )
    })?;

    atomic_write_with(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(out);
        writer.write_record(table.column_names())?;
        for row in &table.rows {
            writer.write_record(row.iter().map(format_cell))?;
        }
        writer.flush()
    })
    .map_err(|e| PipelineError::io(path, e))?;

    log.info(
        Stage::Persist,
        &format!(
            "Saved {} rows x {} columns to {}",
            table.row_count(),
            table.column_count(),
            path.display()
        ),
    );
    Ok(())
}

/// Write any serializable artifact as pretty JSON.
pub fn write_json<T: serde::Serialize>(
    value: &T,
    path: &Path,
    what: &str,
    log: &dyn PipelineLog,
) -> Result<(), PipelineError> {
    atomic_write_json(path, value).map_err(|e| PipelineError::io(path, e))?;
    log.info(Stage::Persist, &format!("Saved {what} to {}", path.display()));
    Ok(())
}

/// Write a model artifact.
pub fn write_model(
    artifact: &ModelArtifact,
    path: &Path,
    log: &dyn PipelineLog,
) -> Result<(), PipelineError> {
    write_json(artifact, path, "model", log)
}

/// Write an evaluation report.
pub fn write_report(
    report: &EvaluationReport,
    path: &Path,
    log: &dyn PipelineLog,
) -> Result<(), PipelineError> {
    write_json(report, path, "evaluation report", log)
}

/// Compute SHA-256 hash of file contents.
pub fn hash_file(path: &Path) -> Result<String, PipelineError> {
    let content = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(hash_bytes(&content))
}

/// Compute SHA-256 hash of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
