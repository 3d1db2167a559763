//! Error types for configuration loading.

use std::path::PathBuf;

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {0}")]
    Extract(Box<figment::Error>),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid() {
        let err = ConfigError::invalid("split.test_size must be in (0, 1), got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: split.test_size must be in (0, 1), got 1.5"
        );
    }

    #[test]
    fn test_error_display_missing_file() {
        let err = ConfigError::FileNotFound {
            path: PathBuf::from("/nope/manifest.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /nope/manifest.toml"
        );
    }
}
