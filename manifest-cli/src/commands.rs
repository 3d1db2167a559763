//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, EvaluateArgs, ProcessArgs, RunArgs};
use anyhow::Context;
use manifest_core::PipelineConfig;
use manifest_ml::{Pipeline, TracingLog};
use std::path::Path;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    mut config: PipelineConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => {
            apply_run_overrides(&mut config, args);
            handle_run(config, workspace)
        }
        Commands::Process(args) => {
            apply_process_overrides(&mut config, args);
            handle_process(config, workspace)
        }
        Commands::Evaluate(args) => {
            apply_evaluate_overrides(&mut config, args);
            handle_evaluate(config, workspace)
        }
        Commands::Config { action } => handle_config(action, &config, workspace),
    }
}

fn apply_run_overrides(config: &mut PipelineConfig, args: RunArgs) {
    if let Some(input) = args.input {
        config.paths.input = input;
    }
    if let Some(processed) = args.processed {
        config.paths.processed = processed;
    }
    if let Some(model) = args.model {
        config.paths.model = model;
    }
    if args.report.is_some() {
        config.paths.report = args.report;
    }
    if let Some(target) = args.target {
        config.split.target_column = target;
    }
    if let Some(test_size) = args.test_size {
        config.split.test_size = test_size;
    }
    if let Some(trees) = args.trees {
        config.forest.n_estimators = trees;
    }
    if let Some(seed) = args.seed {
        config.split.seed = seed;
        config.forest.seed = seed;
    }
}

fn apply_process_overrides(config: &mut PipelineConfig, args: ProcessArgs) {
    if let Some(input) = args.input {
        config.paths.input = input;
    }
    if let Some(processed) = args.processed {
        config.paths.processed = processed;
    }
}

fn apply_evaluate_overrides(config: &mut PipelineConfig, args: EvaluateArgs) {
    if let Some(processed) = args.processed {
        config.paths.processed = processed;
    }
    if let Some(model) = args.model {
        config.paths.model = model;
    }
    if args.report.is_some() {
        config.paths.report = args.report;
    }
}

fn handle_run(config: PipelineConfig, workspace: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config).with_root(workspace);
    tracing::info!(input = %pipeline.input_path().display(), "Starting pipeline run");
    let outcome = pipeline.run(&TracingLog).context("Pipeline run failed")?;

    println!("{}", outcome.report.render());
    println!(
        "Features: {} rows x {} columns ({} train / {} test)",
        outcome.feature_rows, outcome.feature_columns, outcome.train_rows, outcome.test_rows
    );
    println!("Processed data: {}", outcome.processed_path.display());
    println!("Model: {}", outcome.model_path.display());
    if let Some(report) = &outcome.report_path {
        println!("Report: {}", report.display());
    }
    Ok(())
}

fn handle_process(config: PipelineConfig, workspace: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config).with_root(workspace);
    let processed = pipeline
        .process(&TracingLog)
        .context("Data processing failed")?;
    println!(
        "Processed {} rows x {} columns -> {}",
        processed.table.row_count(),
        processed.table.column_count(),
        processed.path.display()
    );
    println!(
        "Missing values in raw input: {}",
        processed.raw_quality.missing_summary()
    );
    Ok(())
}

fn handle_evaluate(config: PipelineConfig, workspace: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config).with_root(workspace);
    let report = pipeline
        .evaluate_saved(&TracingLog)
        .with_context(|| format!("Evaluating {} failed", pipeline.model_path().display()))?;
    println!("{}", report.render());
    Ok(())
}

fn handle_config(action: ConfigAction, config: &PipelineConfig, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".manifest");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&PipelineConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
