// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Batch fix requests
//!
//! Input is either a JSON array of issues or one issue per line (JSON Lines).

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

use remedy_core::application::{process_batch, BatchItem};
use remedy_core::domain::pipeline_config::PipelineConfigManifest;

use crate::services;

#[derive(Args)]
pub struct BatchArgs {
    /// File with a JSON array of issues, or JSON Lines
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write the full report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Requests in flight (default: generation.max_concurrency)
    #[arg(long)]
    concurrency: Option<usize>,
}

pub async fn execute(args: BatchArgs, config: &PipelineConfigManifest) -> Result<()> {
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read batch file {:?}", args.input))?;
    let issues = parse_issues(&content)
        .with_context(|| format!("Failed to parse batch file {:?}", args.input))?;

    let concurrency = args
        .concurrency
        .unwrap_or(config.spec.generation.max_concurrency);

    let services = services::build(config).await?;
    let report = process_batch(&services.orchestrator, issues, concurrency).await;

    let rendered = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    for item in &report.items {
        match item {
            BatchItem::Rejected { index, reason } => {
                eprintln!("{} #{} rejected: {}", "✗".red(), index, reason)
            }
            BatchItem::Failed { index, error } => {
                eprintln!("{} #{} failed: {}", "✗".red(), index, error)
            }
            BatchItem::Fixed { .. } => {}
        }
    }
    eprintln!(
        "{} fixed, {} rejected, {} failed of {}",
        report.fixed.to_string().green(),
        report.rejected.to_string().yellow(),
        report.failed.to_string().red(),
        report.total()
    );

    if !report.is_complete_success() {
        anyhow::bail!(
            "{} of {} issues were not fixed",
            report.rejected + report.failed,
            report.total()
        );
    }

    Ok(())
}

fn parse_issues(content: &str) -> Result<Vec<Value>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let issues = parse_issues(r#"[{"category": "ssl", "title": "a"}, "odd"]"#).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1], Value::String("odd".into()));
    }

    #[test]
    fn test_parse_json_lines() {
        let content = "{\"category\": \"ssl\", \"title\": \"a\"}\n\n{\"category\": \"cookies\", \"title\": \"b\"}\n";
        let issues = parse_issues(content).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1]["category"], "cookies");
    }

    #[test]
    fn test_bad_line_is_reported() {
        let err = parse_issues("{\"title\": \"a\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
