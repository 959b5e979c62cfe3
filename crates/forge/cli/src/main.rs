//! Forge CLI - replay recorded builds and grade solutions locally
//!
//! - `replay` drives a recorded generation fixture through the whole
//!   builder pipeline, with the configured store
//! - `grade` judges a candidate solution against a saved problem
//! - `check-config` prints the effective configuration

use clap::{Parser, Subcommand};
use forge_builder::ForgeConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use error::CliResult;

/// Forge CLI application
#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Forge - generated, cross-validated algorithm exercises", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FORGE_CONFIG")]
    config: Option<String>,

    /// Log level (overrides logging.level)
    #[arg(long, env = "FORGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FORGE_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a recorded generation fixture through the builder pipeline
    Replay {
        /// Fixture file: {"problem": {..}, "testFactories": [..]}
        #[arg(short, long)]
        fixture: PathBuf,

        /// Problem name to build (defaults to the fixture's title)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Grade a solution against a saved problem
    Grade {
        /// Saved problem document
        #[arg(short, long)]
        problem: PathBuf,

        /// Solution source file
        #[arg(short, long)]
        solution: PathBuf,

        /// Print per-case reports as JSON
        #[arg(long = "report-json")]
        report_json: bool,
    },

    /// Show the effective configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let config = ForgeConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Replay { fixture, name } => commands::replay::execute(&config, &fixture, name).await,
        Commands::Grade {
            problem,
            solution,
            report_json,
        } => commands::grade::execute(&config, &problem, &solution, report_json).await,
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
