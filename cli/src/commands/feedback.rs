// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use remedy_core::application::FeedbackResult;
use remedy_core::domain::feedback::{FeedbackEvent, FeedbackOutcome};
use remedy_core::domain::issue::StructuredIssue;
use remedy_core::domain::pipeline_config::PipelineConfigManifest;

use crate::services;

#[derive(Args)]
pub struct FeedbackArgs {
    #[arg(long)]
    category: String,

    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// positive or negative
    #[arg(long)]
    outcome: FeedbackOutcome,
}

pub async fn execute(args: FeedbackArgs, config: &PipelineConfigManifest) -> Result<()> {
    let issue = StructuredIssue::new(&args.category, args.title, args.description).context("Invalid issue")?;
    let event = FeedbackEvent {
        issue: issue.identity(),
        outcome: args.outcome,
        timestamp: Utc::now(),
    };

    let services = services::build(config).await?;
    let result = services
        .feedback
        .record_feedback(&event)
        .await
        .context("Failed to record feedback")?;

    match result {
        FeedbackResult::Applied {
            fingerprint,
            previous_success_rate,
            success_rate,
        } => println!(
            "{} {} success rate {:.2} → {:.2}",
            "✓".green(),
            fingerprint.as_str().dimmed(),
            previous_success_rate,
            success_rate
        ),
        FeedbackResult::NoEntry { fingerprint } => println!(
            "{} No cached solution for {}; feedback ignored",
            "!".yellow(),
            fingerprint.as_str().dimmed()
        ),
    }

    Ok(())
}
