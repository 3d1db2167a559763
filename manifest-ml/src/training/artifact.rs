//! Versioned on-disk form of a trained model.

use crate::data::storage::write_model;
use crate::error::PipelineError;
use crate::log::PipelineLog;
use crate::stage::Stage;
use crate::training::forest::RandomForestModel;
use manifest_core::{ForestConfig, SplitConfig};
use manifest_core::persistence::load_json;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Artifact layout understood by this build.
pub const FORMAT_VERSION: u32 = 2;

/// A model plus what it takes to reproduce and audit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Target column and the partition the model was scored on.
    pub split: SplitConfig,
    pub forest: ForestConfig,
    /// SHA-256 of the processed table the model was trained from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sha256: Option<String>,
    pub model: RandomForestModel,
}

impl ModelArtifact {
    pub fn new(
        model: RandomForestModel,
        split: SplitConfig,
        forest: ForestConfig,
        data_sha256: Option<String>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            split,
            forest,
            data_sha256,
            model,
        }
    }

    pub fn save(&self, path: &Path, log: &dyn PipelineLog) -> Result<(), PipelineError> {
        write_model(self, path, log)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let artifact: Self = load_json(path)
            .map_err(|e| PipelineError::io(path, e))?
            .ok_or_else(|| {
                PipelineError::io(
                    path,
                    io::Error::new(io::ErrorKind::NotFound, "model artifact not found"),
                )
            })?;
        if artifact.format_version != FORMAT_VERSION {
            return Err(PipelineError::validation(
                Stage::Evaluate,
                format!(
                    "model artifact format {} is not supported (expected {FORMAT_VERSION})",
                    artifact.format_version
                ),
            ));
        }
        Ok(artifact)
    }

    pub fn target_column(&self) -> &str {
        &self.split.target_column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataTable;
    use crate::log::NullLog;
    use crate::training::Trainer;
    use serde_json::json;

    fn artifact() -> ModelArtifact {
        let x = DataTable::from_rows(
            &["Fare", "IsAlone"],
            (0..12).map(|i| vec![json!(i as f64 * 2.5), json!(i % 2)]).collect(),
        );
        let y: Vec<_> = (0..12).map(|i| json!(1 + i / 4)).collect();
        let forest = ForestConfig {
            n_estimators: 3,
            ..ForestConfig::default()
        };
        let model = Trainer::new(forest.clone()).fit(&x, &y, &NullLog).unwrap();
        let split = SplitConfig {
            target_column: "Pclass".into(),
            test_size: 0.25,
            seed: 7,
        };
        ModelArtifact::new(model, split, forest, Some("abc".into()))
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");
        let original = artifact();
        original.save(&path, &NullLog).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.model.classes, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(loaded.target_column(), "Pclass");
        assert_eq!((loaded.split.test_size, loaded.split.seed), (0.25, 7));
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_unknown_format_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut future = artifact();
        future.format_version = FORMAT_VERSION + 1;
        future.save(&path, &NullLog).unwrap();
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[test]
    fn test_corrupt_artifact_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ModelArtifact::load(&path), Err(PipelineError::Io { .. })));
    }
}
