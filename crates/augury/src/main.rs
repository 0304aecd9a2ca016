//! # Augury CLI
//!
//! *"What is asked of the oracle, the oracle answers"*
//!
//! Command-line interface for the Augury model-serving cache. Commands run
//! the prediction service in-process against the configured model directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "augury")]
#[command(author = "Daemoniorum Engineering")]
#[command(version)]
#[command(about = "In-process model-serving cache for predictive models", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory holding model artifacts (overrides config)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Serve the demo model for identifiers with no artifact
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single prediction
    Predict {
        /// Model identifier
        model: String,

        /// Input as a JSON object
        #[arg(short, long)]
        input: String,

        /// Include confidence and class probabilities
        #[arg(short, long)]
        probabilities: bool,

        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Run a batch of predictions from a JSON file
    Batch {
        /// Model identifier
        model: String,

        /// File with a JSON array of input objects
        #[arg(short, long)]
        inputs: PathBuf,

        /// Include confidence and class probabilities
        #[arg(short, long)]
        probabilities: bool,

        /// Print service metrics after the batch
        #[arg(long)]
        metrics: bool,
    },

    /// Manage models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Write a demo artifact into the model directory
    Init {
        /// Model identifier
        model: String,

        /// Overwrite an existing artifact
        #[arg(short, long)]
        force: bool,
    },

    /// Load a model and show its information
    Info {
        /// Model identifier
        model: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let telemetry_config = vassago::TelemetryConfig::new("augury")
        .with_log_level(&cli.log_level)
        .with_json_logs(cli.json_logs);
    vassago::init_logging(&telemetry_config);

    let mut cfg = config::load();
    if let Some(dir) = cli.model_dir {
        cfg.model_dir = dir;
    }
    if cli.demo {
        cfg.demo_fallback = true;
    }

    match cli.command {
        Commands::Predict {
            model,
            input,
            probabilities,
            no_cache,
        } => commands::predict(cfg, &model, &input, probabilities, !no_cache).await?,

        Commands::Batch {
            model,
            inputs,
            probabilities,
            metrics,
        } => commands::batch(cfg, &model, &inputs, probabilities, metrics).await?,

        Commands::Model { action } => match action {
            ModelAction::Init { model, force } => commands::model_init(&cfg, &model, force).await?,
            ModelAction::Info { model } => commands::model_info(cfg, &model).await?,
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => config::show_config(&cfg)?,
            ConfigAction::Path => println!("{}", config::config_path().display()),
        },
    }

    Ok(())
}
