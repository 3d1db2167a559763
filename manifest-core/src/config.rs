//! Configuration system for the manifest pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> explicit file -> environment. CLI flags are applied
//! by the caller on top of the extracted value.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw delimited input file.
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Destination of the processed feature table.
    #[serde(default = "default_processed")]
    pub processed: PathBuf,
    /// Destination of the serialized model artifact.
    #[serde(default = "default_model")]
    pub model: PathBuf,
    /// Optional destination for the JSON evaluation report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            processed: default_processed(),
            model: default_model(),
            report: None,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("data/raw/titanic.csv")
}

fn default_processed() -> PathBuf {
    PathBuf::from("data/processed/titanic_processed.csv")
}

fn default_model() -> PathBuf {
    PathBuf::from("models/titanic_model.json")
}

/// Delimited-file format settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Field delimiter for both input and processed files.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

/// Train/test split parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Column the classifier learns to predict.
    #[serde(default = "default_target")]
    pub target_column: String,
    /// Fraction of rows held out for evaluation, in (0, 1).
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Seed for the row permutation.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            target_column: default_target(),
            test_size: default_test_size(),
            seed: default_seed(),
        }
    }
}

fn default_target() -> String {
    "Pclass".to_string()
}

fn default_test_size() -> f64 {
    0.3
}

fn default_seed() -> u64 {
    42
}

/// How many candidate features each split considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    #[default]
    Sqrt,
    Log2,
    All,
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns (at least 1).
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features.max(1);
        let k = match self {
            Self::Sqrt => (n as f64).sqrt().floor() as usize,
            Self::Log2 => (n as f64).log2().floor() as usize,
            Self::All => n,
            Self::Count(k) => k,
        };
        k.clamp(1, n)
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Master seed for bootstrap and feature sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Maximum tree depth (unbounded when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub max_features: MaxFeatures,
    /// Minimum number of samples required to split a node.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            seed: default_seed(),
            max_depth: None,
            max_features: MaxFeatures::default(),
            min_samples_split: default_min_samples_split(),
        }
    }
}

fn default_n_estimators() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive for the stderr layer.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for JSON log files (platform data dir when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PipelineConfig {
    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let test_size = self.split.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ConfigError::invalid(format!(
                "split.test_size must be in (0, 1), got {test_size}"
            )));
        }
        if self.split.target_column.trim().is_empty() {
            return Err(ConfigError::invalid("split.target_column is empty"));
        }
        if self.forest.n_estimators == 0 {
            return Err(ConfigError::invalid("forest.n_estimators must be at least 1"));
        }
        if self.forest.min_samples_split < 2 {
            return Err(ConfigError::invalid(
                "forest.min_samples_split must be at least 2",
            ));
        }
        if self.forest.max_features == MaxFeatures::Count(0) {
            return Err(ConfigError::invalid("forest.max_features count must be at least 1"));
        }
        if !self.data.delimiter.is_ascii() {
            return Err(ConfigError::invalid(format!(
                "data.delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            )));
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "manifest", "manifest")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `MANIFEST_`, `__` separates sections)
/// 2. Explicit config file (`--config`)
/// 3. Workspace-local config (`.manifest/config.toml`)
/// 4. User config (`~/.config/manifest/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<PipelineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".manifest").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // MANIFEST_SPLIT__TEST_SIZE, MANIFEST_FOREST__N_ESTIMATORS, ...
    figment = figment.merge(Env::prefixed("MANIFEST_").split("__"));

    let config: PipelineConfig = figment.extract()?;
    config.validate()?;
    tracing::debug!(?config, "Loaded pipeline configuration");
    Ok(config)
}

/// Check whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| ws.join(".manifest").join("config.toml").exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.split.target_column, "Pclass");
        assert_eq!(config.split.test_size, 0.3);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.forest.max_features, MaxFeatures::Sqrt);
        assert_eq!(config.data.delimiter, ',');
        assert!(config.paths.report.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = PipelineConfig::default();
        config.forest.max_depth = Some(8);
        config.forest.max_features = MaxFeatures::Count(3);
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: PipelineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str("[split]\ntarget_column = \"Survived\"\n").unwrap();
        assert_eq!(config.split.target_column, "Survived");
        assert_eq!(config.split.test_size, 0.3);
        assert_eq!(config.forest.n_estimators, 100);
    }

    #[test]
    fn test_validate_rejects_bad_test_size() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let mut config = PipelineConfig::default();
            config.split.test_size = bad;
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { .. })),
                "test_size {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_zero_trees() {
        let mut config = PipelineConfig::default();
        config.forest.n_estimators = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Log2.resolve(10), 3);
        assert_eq!(MaxFeatures::All.resolve(10), 10);
        assert_eq!(MaxFeatures::Count(50).resolve(10), 10);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
    }

    #[test]
    fn test_load_config_layers() {
        Jail::expect_with(|jail| {
            jail.create_dir(".manifest")?;
            jail.create_file(
                ".manifest/config.toml",
                r#"
[split]
target_column = "Survived"
test_size = 0.2

[forest]
n_estimators = 25
"#,
            )?;
            jail.create_file("override.toml", "[forest]\nn_estimators = 50\n")?;
            jail.set_env("MANIFEST_SPLIT__TEST_SIZE", "0.25");

            let ws = jail.directory().to_path_buf();
            let config = load_config(Some(&ws), Some(Path::new("override.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.split.target_column, "Survived");
            assert_eq!(config.split.test_size, 0.25);
            assert_eq!(config.forest.n_estimators, 50);
            assert_eq!(config.forest.seed, 42);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = load_config(None, Some(Path::new("does-not-exist.toml"))).unwrap_err();
            assert!(matches!(err, ConfigError::FileNotFound { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_load_config_validates() {
        Jail::expect_with(|jail| {
            jail.set_env("MANIFEST_FOREST__N_ESTIMATORS", "0");
            let err = load_config(None, None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }));
            Ok(())
        });
    }
}
