// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use remedy_core::domain::pipeline_config::{PipelineConfigManifest, StorageKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./remedy-config.yaml)
        #[arg(short, long, default_value = "./remedy-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = PipelineConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. REMEDY_CONFIG_PATH: {}",
            std::env::var("REMEDY_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./remedy-config.yaml");
        println!("  4. ~/.remedy/config.yaml");
        println!("  5. /etc/remedy/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let spec = &config.spec;
    println!("{} {}", "Current configuration:".bold(), config.metadata.name);
    println!();

    println!("{}", "Solution Cache:".bold());
    println!("  Min success rate: {}", spec.cache.min_success_rate);
    println!("  Similarity threshold: {}", spec.cache.similarity_threshold);
    println!(
        "  Weights: title {} / description {}",
        spec.cache.title_weight, spec.cache.description_weight
    );
    match spec.storage.backend {
        StorageKind::InMemory => println!("  Storage: in-memory"),
        StorageKind::Postgres => println!("  Storage: postgres"),
    }
    println!();

    println!("{}", "LLM Providers:".bold());
    if spec.generation.providers.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    for provider in &spec.generation.providers {
        let state = if provider.enabled { "" } else { " [disabled]" };
        println!("  {} ({}){}", provider.name.bold(), provider.provider_type, state);
        if let Some(endpoint) = &provider.endpoint {
            println!("    Endpoint: {}", endpoint);
        }
        for model in &provider.models {
            println!("      - {} → {}", model.alias, model.model);
        }
    }
    println!(
        "  Default model: {}, retries: {}, concurrency: {}",
        spec.generation.default_model, spec.generation.max_retries, spec.generation.max_concurrency
    );
    println!();

    println!("{}", "Authoritative Provider:".bold());
    match &spec.authoritative {
        Some(authoritative) => println!("  Endpoint: {}", authoritative.endpoint),
        None => println!("  {}", "(disabled)".dimmed()),
    }
    println!();

    println!("{}", "Routing:".bold());
    for (category, route) in &spec.routing.routes {
        let mut flags = Vec::new();
        if let Some(document_type) = route.document_type {
            flags.push(document_type.as_str().to_string());
        }
        if route.authoritative {
            flags.push("authoritative".to_string());
        }
        if route.prefer_template {
            flags.push("template first".to_string());
        }
        println!("  {} → {} {}", category, route.fix_type.as_str(), flags.join(", ").dimmed());
    }
    if !spec.templates.overrides.is_empty() {
        let overridden: Vec<&str> = spec.templates.overrides.keys().map(String::as_str).collect();
        println!("  Template overrides: {}", overridden.join(", "));
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = PipelineConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = sample_config(with_examples);

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample_config(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}
