// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Batch Processing
//
// Runs many raw scanner payloads through ingress validation and the
// orchestrator. Every item yields an explicit result; nothing is dropped or
// only logged. Output order matches input order.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::application::orchestrator::GenerationOrchestrator;
use crate::domain::artifact::FixArtifact;
use crate::domain::errors::TerminalError;
use crate::domain::issue::StructuredIssue;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
    Fixed { index: usize, artifact: FixArtifact },
    /// The payload failed ingress validation and never reached the pipeline
    Rejected { index: usize, reason: String },
    Failed { index: usize, error: TerminalError },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub fixed: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        let mut report = Self::default();
        for item in &items {
            match item {
                BatchItem::Fixed { .. } => report.fixed += 1,
                BatchItem::Rejected { .. } => report.rejected += 1,
                BatchItem::Failed { .. } => report.failed += 1,
            }
        }
        report.items = items;
        report
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// Process `values` with at most `concurrency` requests in flight.
pub async fn process_batch(
    orchestrator: &GenerationOrchestrator,
    values: Vec<Value>,
    concurrency: usize,
) -> BatchReport {
    let total = values.len();

    let items: Vec<BatchItem> = stream::iter(values.into_iter().enumerate())
        .map(|(index, value)| async move {
            let issue = match StructuredIssue::from_value(value) {
                Ok(issue) => issue,
                Err(e) => {
                    return BatchItem::Rejected {
                        index,
                        reason: e.to_string(),
                    }
                }
            };
            match orchestrator.process(&issue).await {
                Ok(artifact) => BatchItem::Fixed { index, artifact },
                Err(error) => BatchItem::Failed { index, error },
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let report = BatchReport::from_items(items);
    info!(
        total,
        fixed = report.fixed,
        rejected = report.rejected,
        failed = report.failed,
        "Batch processed"
    );
    report
}
