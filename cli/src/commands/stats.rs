// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use colored::Colorize;

use remedy_core::domain::pipeline_config::PipelineConfigManifest;

use crate::services;

pub async fn execute(config: &PipelineConfigManifest) -> Result<()> {
    let services = services::build(config).await?;
    let stats = services
        .orchestrator
        .cache()
        .get_stats()
        .await
        .context("Failed to read cache statistics")?;

    println!("{}", "Solution cache:".bold());
    println!("  Entries: {}", stats.total_entries);
    println!("  Uses: {}", stats.total_usage);
    println!("  Hits: {}", stats.total_hits);
    println!("  Average success rate: {:.2}", stats.average_success_rate);

    if !stats.categories.is_empty() {
        println!();
        println!("{}", "By category:".bold());
        for (category, category_stats) in &stats.categories {
            println!(
                "  {}: {} entries, {} hits, success rate {:.2}",
                category.bold(),
                category_stats.entries,
                category_stats.hits,
                category_stats.average_success_rate
            );
        }
    }

    Ok(())
}
