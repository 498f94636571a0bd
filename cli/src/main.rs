// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Remedy CLI
//!
//! The `remedy` binary turns scanner findings into remediation artifacts.
//!
//! ## Commands
//!
//! - `remedy fix` - Produce a fix for a single issue
//! - `remedy batch` - Produce fixes for a file of issues
//! - `remedy feedback` - Report whether a served fix helped
//! - `remedy stats` - Show solution cache statistics
//! - `remedy serve` - Run the HTTP API
//! - `remedy config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod services;

use commands::{BatchArgs, ConfigCommand, FeedbackArgs, FixArgs, ServeArgs};
use remedy_core::domain::pipeline_config::PipelineConfigManifest;

/// Remedy - Compliance remediation pipeline
#[derive(Parser)]
#[command(name = "remedy")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "REMEDY_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "REMEDY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce a fix for one issue
    #[command(name = "fix")]
    Fix(FixArgs),

    /// Produce fixes for every issue in a file
    #[command(name = "batch")]
    Batch(BatchArgs),

    /// Record feedback for a served fix
    #[command(name = "feedback")]
    Feedback(FeedbackArgs),

    /// Show solution cache statistics
    #[command(name = "stats")]
    Stats,

    /// Run the HTTP API
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Config { command } = cli.command {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = PipelineConfigManifest::load_or_default(cli.config.clone())
        .context("Failed to load configuration")?;
    let logging = &config.spec.observability.logging;
    init_logging(cli.log_level.as_deref().unwrap_or(&logging.level), &logging.format)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    match cli.command {
        Commands::Fix(args) => commands::fix::execute(args, &config).await,
        Commands::Batch(args) => commands::batch::execute(args, &config).await,
        Commands::Feedback(args) => commands::feedback::execute(args, &config).await,
        Commands::Stats => commands::stats::execute(&config).await,
        Commands::Serve(args) => commands::serve::execute(args, &config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` wins over `level`.
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
