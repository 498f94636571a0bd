// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Feedback Learner
//
// Moves a cache entry's success rate in response to user feedback.
// Negative steps are larger than positive ones, so trust decays faster than
// it builds. Feedback for an unknown issue is a no-op.

use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::events::RemediationEvent;
use crate::domain::feedback::{FeedbackEvent, FeedbackOutcome};
use crate::domain::fingerprint::{Fingerprint, IssueFingerprinter};
use crate::domain::pipeline_config::FeedbackConfig;
use crate::domain::repository::{RepositoryError, SolutionRepository};
use crate::infrastructure::event_bus::EventBus;

/// What a piece of feedback did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackResult {
    Applied {
        fingerprint: Fingerprint,
        previous_success_rate: f64,
        success_rate: f64,
    },
    NoEntry {
        fingerprint: Fingerprint,
    },
}

pub struct FeedbackLearner {
    repository: Arc<dyn SolutionRepository>,
    event_bus: Arc<EventBus>,
    config: FeedbackConfig,
}

impl FeedbackLearner {
    pub fn new(repository: Arc<dyn SolutionRepository>, event_bus: Arc<EventBus>, config: FeedbackConfig) -> Self {
        Self {
            repository,
            event_bus,
            config,
        }
    }

    fn delta(&self, outcome: FeedbackOutcome) -> f64 {
        match outcome {
            FeedbackOutcome::Positive => self.config.positive_step,
            FeedbackOutcome::Negative => -self.config.negative_step,
        }
    }

    pub async fn record_feedback(&self, feedback: &FeedbackEvent) -> Result<FeedbackResult, RepositoryError> {
        let fingerprint = IssueFingerprinter::for_identity(&feedback.issue);
        counter!("remedy_feedback_total", "outcome" => feedback.outcome.to_string()).increment(1);

        let change = self
            .repository
            .adjust_success_rate(&fingerprint, self.delta(feedback.outcome), Utc::now())
            .await?;

        let Some(change) = change else {
            debug!(fingerprint = %fingerprint, outcome = %feedback.outcome, "Feedback for unknown issue ignored");
            return Ok(FeedbackResult::NoEntry { fingerprint });
        };

        info!(
            fingerprint = %fingerprint,
            outcome = %feedback.outcome,
            previous = change.previous,
            current = change.current,
            "Applied feedback"
        );

        self.event_bus.publish(RemediationEvent::FeedbackApplied {
            fingerprint: fingerprint.clone(),
            outcome: feedback.outcome,
            old_success_rate: change.previous,
            new_success_rate: change.current,
            timestamp: feedback.timestamp,
        });

        Ok(FeedbackResult::Applied {
            fingerprint,
            previous_success_rate: change.previous,
            success_rate: change.current,
        })
    }
}
