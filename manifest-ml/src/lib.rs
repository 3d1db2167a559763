//! # manifest-ml
//!
//! The stages of the manifest pipeline: loading and cleaning a passenger
//! manifest, feature engineering, a reproducible train/test split, a
//! random forest classifier and its evaluation.
//!
//! Every stage borrows its input and returns a new value, and reports
//! progress through an injected [`PipelineLog`].

pub mod data;
pub mod error;
pub mod eval;
pub mod features;
pub mod log;
pub mod pipeline;
pub mod stage;
pub mod training;

pub use data::{Cleaner, CsvSource, DataQualityReport, DataTable, write_table};
pub use error::PipelineError;
pub use eval::{EvaluationReport, Evaluator};
pub use features::FeatureEngineer;
pub use log::{MemoryLog, NullLog, PipelineLog, TracingLog};
pub use pipeline::{Pipeline, PipelineOutcome, ProcessedData};
pub use stage::Stage;
pub use training::{ModelArtifact, RandomForestModel, SplitData, Splitter, Trainer};

/// Result type for pipeline stages.
pub type Result<T> = std::result::Result<T, PipelineError>;
