//! Stage orchestration.
//!
//! The pipeline only sequences stages and hands each one's output to the
//! next; the first error aborts the run and is returned unchanged.

use crate::data::{
    Cleaner, CsvSource, DataQualityReport, DataTable, hash_file, profile, write_report, write_table,
};
use crate::error::PipelineError;
use crate::eval::{EvaluationReport, Evaluator};
use crate::features::FeatureEngineer;
use crate::log::PipelineLog;
use crate::stage::Stage;
use crate::training::{ModelArtifact, Splitter, Trainer};
use manifest_core::PipelineConfig;
use std::path::{Path, PathBuf};

/// Result of the data-processing half.
#[derive(Debug, Clone)]
pub struct ProcessedData {
    pub table: DataTable,
    /// Quality profile of the raw input.
    pub raw_quality: DataQualityReport,
    pub path: PathBuf,
}

/// Summary of a full run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report: EvaluationReport,
    pub feature_rows: usize,
    pub feature_columns: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub processed_path: PathBuf,
    pub model_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

/// Runs the configured stages in order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    root: PathBuf,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            root: PathBuf::from("."),
        }
    }

    /// Resolve relative configured paths against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.config.paths.input)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.resolve(&self.config.paths.processed)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.config.paths.model)
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.config.paths.report.as_deref().map(|p| self.resolve(p))
    }

    /// Configuration checks shared by every entry point. The split fraction is
    /// checked first so it fails as it would in the splitter itself.
    fn validate(&self) -> Result<(), PipelineError> {
        Splitter::from(&self.config.split).check()?;
        self.config.validate()?;
        Ok(())
    }

    /// Load, clean, engineer features and persist the processed table.
    pub fn process(&self, log: &dyn PipelineLog) -> Result<ProcessedData, PipelineError> {
        self.validate()?;
        let delimiter = self.config.data.delimiter;

        let raw = CsvSource::new(self.input_path(), delimiter).load(log)?;
        let raw_quality = profile(&raw);
        log.info(
            Stage::Load,
            &format!("Missing values: {}", raw_quality.missing_summary()),
        );

        let cleaned = Cleaner::default().apply(&raw, log)?;
        let table = FeatureEngineer::new().apply(&cleaned, log)?;

        let path = self.processed_path();
        write_table(&table, &path, delimiter, log)?;
        Ok(ProcessedData {
            table,
            raw_quality,
            path,
        })
    }

    /// Full run: process, split, train, evaluate, then persist the model.
    pub fn run(&self, log: &dyn PipelineLog) -> Result<PipelineOutcome, PipelineError> {
        let processed = self.process(log)?;
        let data_sha256 = hash_file(&processed.path)?;

        let split = Splitter::from(&self.config.split).split(&processed.table, log)?;
        let model = Trainer::new(self.config.forest.clone()).fit(&split.x_train, &split.y_train, log)?;
        let report = Evaluator::new(&split.target_column).evaluate(&model, &split.x_test, &split.y_test, log)?;

        let model_path = self.model_path();
        ModelArtifact::new(
            model,
            self.config.split.clone(),
            self.config.forest.clone(),
            Some(data_sha256),
        )
        .save(&model_path, log)?;

        let report_path = self.report_path();
        if let Some(path) = &report_path {
            write_report(&report, path, log)?;
        }

        Ok(PipelineOutcome {
            feature_rows: processed.table.row_count(),
            feature_columns: processed.table.column_count(),
            train_rows: split.train_indices.len(),
            test_rows: split.test_indices.len(),
            processed_path: processed.path,
            model_path,
            report_path,
            report,
        })
    }

    /// Reload a persisted model and processed table, re-split and score.
    ///
    /// The split is rebuilt from the parameters stored in the artifact so
    /// the model is scored on the rows it was held out from.
    pub fn evaluate_saved(&self, log: &dyn PipelineLog) -> Result<EvaluationReport, PipelineError> {
        self.validate()?;
        let artifact = ModelArtifact::load(&self.model_path())?;
        let processed_path = self.processed_path();
        let table = CsvSource::new(&processed_path, self.config.data.delimiter).load(log)?;

        if let Some(expected) = &artifact.data_sha256 {
            let actual = hash_file(&processed_path)?;
            if &actual != expected {
                log.warn(
                    Stage::Evaluate,
                    &format!(
                        "{} differs from the data the model was trained on",
                        processed_path.display()
                    ),
                );
            }
        }

        if artifact.split != self.config.split {
            log.warn(
                Stage::Evaluate,
                &format!(
                    "configured split differs from the model's; using target '{}', test_size {}, seed {}",
                    artifact.split.target_column, artifact.split.test_size, artifact.split.seed
                ),
            );
        }

        let split = Splitter::from(&artifact.split).split(&table, log)?;
        let report = Evaluator::new(artifact.target_column()).evaluate(
            &artifact.model,
            &split.x_test,
            &split.y_test,
            log,
        )?;

        if let Some(path) = self.report_path() {
            write_report(&report, &path, log)?;
        }
        Ok(report)
    }
}
