// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the remediation pipeline.
//! Published on the in-process event bus for observability and integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::FixSource;
use super::feedback::FeedbackOutcome;
use super::fingerprint::Fingerprint;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemediationEvent {
    /// A fix request was answered with a valid artifact
    FixServed {
        request_id: Uuid,
        fingerprint: Fingerprint,
        category: String,
        source: FixSource,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Every fallback path failed
    FixRequestFailed {
        request_id: Uuid,
        fingerprint: Fingerprint,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A validated, freshly generated artifact was written to the cache
    SolutionStored {
        fingerprint: Fingerprint,
        category: String,
        model: String,
        usage_count: u64,
        timestamp: DateTime<Utc>,
    },

    /// One call to the generative model failed
    GenerationAttemptFailed {
        fingerprint: Fingerprint,
        attempt: u32,
        transient: bool,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A generated artifact was rejected by the validator
    ArtifactRejected {
        fingerprint: Fingerprint,
        errors: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Feedback moved a cache entry's success rate
    FeedbackApplied {
        fingerprint: Fingerprint,
        outcome: FeedbackOutcome,
        old_success_rate: f64,
        new_success_rate: f64,
        timestamp: DateTime<Utc>,
    },

    /// The solution cache failed and the request continued without it
    CacheDegraded {
        operation: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl RemediationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RemediationEvent::FixServed { .. } => "fix_served",
            RemediationEvent::FixRequestFailed { .. } => "fix_request_failed",
            RemediationEvent::SolutionStored { .. } => "solution_stored",
            RemediationEvent::GenerationAttemptFailed { .. } => "generation_attempt_failed",
            RemediationEvent::ArtifactRejected { .. } => "artifact_rejected",
            RemediationEvent::FeedbackApplied { .. } => "feedback_applied",
            RemediationEvent::CacheDegraded { .. } => "cache_degraded",
        }
    }
}
