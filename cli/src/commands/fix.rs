// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Single fix request

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use remedy_core::domain::artifact::FixArtifact;
use remedy_core::domain::issue::StructuredIssue;
use remedy_core::domain::pipeline_config::PipelineConfigManifest;

use crate::services;

#[derive(Args)]
pub struct FixArgs {
    /// Issue category (e.g. datenschutz, cookies, ssl)
    #[arg(long, required_unless_present = "file")]
    category: Option<String>,

    /// Issue title
    #[arg(long, required_unless_present = "file")]
    title: Option<String>,

    /// Issue description
    #[arg(long, default_value = "")]
    description: String,

    /// Read the raw scanner issue from a JSON file instead
    #[arg(long, value_name = "FILE", conflicts_with_all = ["category", "title"])]
    file: Option<PathBuf>,

    /// Print the artifact as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: FixArgs, config: &PipelineConfigManifest) -> Result<()> {
    let raw = match &args.file {
        Some(path) => read_issue(path)?,
        None => json!({
            "category": args.category,
            "title": args.title,
            "description": args.description,
        }),
    };
    let issue = StructuredIssue::from_value(raw).context("Invalid issue")?;

    let services = services::build(config).await?;
    let artifact = services.orchestrator.process(&issue).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_artifact(&artifact);
    }

    Ok(())
}

fn read_issue(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read issue file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse issue file {:?}", path))
}

fn print_artifact(artifact: &FixArtifact) {
    println!(
        "{} {} fix from {} (confidence {:.2})",
        "✓".green(),
        artifact.fix_type.as_str().bold(),
        artifact.source.as_str().cyan(),
        artifact.confidence
    );
    println!("  Fingerprint: {}", artifact.fingerprint.as_str().dimmed());
    if let Some(model) = &artifact.model_used {
        println!("  Model: {}", model);
    }
    println!();
    println!("{}", "Content:".bold());
    println!("{}", artifact.content);
    if !artifact.integration_instructions.is_empty() {
        println!();
        println!("{}", "Integration:".bold());
        println!("{}", artifact.integration_instructions);
    }
}
