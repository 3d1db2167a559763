//! # manifest-core
//!
//! Foundations shared by the `manifest` crates: layered pipeline
//! configuration and atomic file persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    DataConfig, ForestConfig, LoggingConfig, MaxFeatures, PathsConfig, PipelineConfig, SplitConfig,
    config_exists, load_config,
};
pub use error::ConfigError;
