//! Error types for the manifest-ml crate.

use crate::stage::Stage;
use manifest_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pipeline stages.
///
/// Every variant carries enough context (stage, column, path) to diagnose a
/// failed run without re-running it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Data load error ({path}): {message}")]
    DataLoad { path: PathBuf, message: String },

    #[error("Schema error in {stage} stage, column '{column}': {message}")]
    Schema {
        stage: Stage,
        column: String,
        message: String,
    },

    #[error("Validation error in {stage} stage: {message}")]
    Validation { stage: Stage, message: String },

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn data_load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DataLoad {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// A required column is absent from the table's schema.
    pub fn missing_column(stage: Stage, column: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            column: column.into(),
            message: "required column is missing".to_string(),
        }
    }

    pub fn schema(stage: Stage, column: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            column: column.into(),
            message: msg.into(),
        }
    }

    pub fn validation(stage: Stage, msg: impl Into<String>) -> Self {
        Self::Validation {
            stage,
            message: msg.into(),
        }
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
