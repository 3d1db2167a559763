//! manifest CLI: runs the passenger-manifest ETL and training pipeline.

mod commands;

use clap::Parser;
use manifest_core::LoggingConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// manifest: clean a passenger manifest, train a random forest, report on it
#[derive(Parser, Debug)]
#[command(name = "manifest", version, about, long_about = None)]
struct Cli {
    /// Workspace directory; relative paths resolve against it
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline: process, split, train, evaluate, save the model
    Run(RunArgs),
    /// Load, clean and engineer features, then save the processed table
    Process(ProcessArgs),
    /// Score a saved model against the saved processed table
    Evaluate(EvaluateArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Raw input file
    #[arg(long)]
    input: Option<PathBuf>,
    /// Processed table destination
    #[arg(long)]
    processed: Option<PathBuf>,
    /// Model artifact destination
    #[arg(long)]
    model: Option<PathBuf>,
    /// Also write the evaluation report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Column to predict
    #[arg(long)]
    target: Option<String>,
    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,
    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,
    /// Seed for both the split and the forest
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args, Debug, Default)]
struct ProcessArgs {
    /// Raw input file
    #[arg(long)]
    input: Option<PathBuf>,
    /// Processed table destination
    #[arg(long)]
    processed: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Default)]
struct EvaluateArgs {
    /// Processed table to split and score
    #[arg(long)]
    processed: Option<PathBuf>,
    /// Model artifact to load
    #[arg(long)]
    model: Option<PathBuf>,
    /// Also write the evaluation report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration to .manifest/config.toml
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());

    let config = manifest_core::load_config(Some(&workspace), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let _guard = init_logging(&cli, &config.logging, &workspace);

    commands::handle_command(cli.command, config, &workspace)
}

/// Stderr filter: `RUST_LOG`, then `LOG_LEVEL`, then `-v`/`-q`, then config.
fn stderr_filter(cli: &Cli, logging: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_env("LOG_LEVEL") {
        return filter;
    }
    let directive = match cli.verbose {
        0 if cli.quiet => "error",
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Human-readable stderr plus JSON file logging.
fn init_logging(
    cli: &Cli,
    logging: &LoggingConfig,
    workspace: &Path,
) -> tracing_appender::non_blocking::WorkerGuard {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter(cli, logging));

    let log_dir = match &logging.log_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => workspace.join(dir),
        None => directories::ProjectDirs::from("dev", "manifest", "manifest")
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "manifest.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}
