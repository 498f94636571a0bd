// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pipeline Error Taxonomy
//!
//! Errors raised by external collaborators are translated into
//! [`RemediationError`] at the orchestrator boundary and never leak upward.
//! A caller only ever sees a valid artifact or a [`TerminalError`].
//!
//! | Variant | Raised by | Pipeline reaction |
//! |---------|-----------|-------------------|
//! | `TransientExternal` | timeout, 5xx, rate limit | retried with backoff, then fall through |
//! | `PermanentExternal` | auth, malformed request | fall through immediately |
//! | `Validation` | artifact validator | one regeneration, then template |
//! | `CacheUnavailable` | solution repository | degrade to direct generation |
//! | `GenerationUnavailable` | no provider configured | skip to template |

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fingerprint::Fingerprint;
use super::legal_text::LegalTextError;
use super::llm::LLMError;
use super::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalService {
    LegalTextProvider,
    GenerativeModel,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalService::LegalTextProvider => f.write_str("legal-text provider"),
            ExternalService::GenerativeModel => f.write_str("generative model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationError {
    #[error("Transient error from {service}: {message}")]
    TransientExternal {
        service: ExternalService,
        message: String,
    },

    #[error("Permanent error from {service}: {message}")]
    PermanentExternal {
        service: ExternalService,
        message: String,
    },

    #[error("Artifact failed validation: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Solution cache unavailable: {message}")]
    CacheUnavailable { message: String },

    #[error("Generation unavailable: {message}")]
    GenerationUnavailable { message: String },
}

impl From<LLMError> for RemediationError {
    fn from(err: LLMError) -> Self {
        let service = ExternalService::GenerativeModel;
        if err.is_transient() {
            RemediationError::TransientExternal {
                service,
                message: err.to_string(),
            }
        } else {
            RemediationError::PermanentExternal {
                service,
                message: err.to_string(),
            }
        }
    }
}

impl From<LegalTextError> for RemediationError {
    fn from(err: LegalTextError) -> Self {
        let service = ExternalService::LegalTextProvider;
        if err.is_transient() {
            RemediationError::TransientExternal {
                service,
                message: err.to_string(),
            }
        } else {
            RemediationError::PermanentExternal {
                service,
                message: err.to_string(),
            }
        }
    }
}

impl From<RepositoryError> for RemediationError {
    fn from(err: RepositoryError) -> Self {
        RemediationError::CacheUnavailable {
            message: err.to_string(),
        }
    }
}

/// Steps of the fallback chain, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Authoritative,
    Cache,
    Template,
    Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: PipelineStep,
    pub error: RemediationError,
}

/// Every fallback path was exhausted without a valid artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("No valid fix for {fingerprint}: {last_error}")]
pub struct TerminalError {
    pub fingerprint: Fingerprint,
    /// The most actionable error seen along the chain
    pub last_error: RemediationError,
    pub trail: Vec<StepFailure>,
}

impl TerminalError {
    /// Build from a failure trail. Cache outages are never the actionable
    /// cause when a later step failed too, so they are skipped when picking
    /// the last error.
    pub fn from_trail(fingerprint: Fingerprint, trail: Vec<StepFailure>) -> Self {
        let last_error = trail
            .iter()
            .rev()
            .find(|f| !matches!(f.error, RemediationError::CacheUnavailable { .. }))
            .or_else(|| trail.last())
            .map(|f| f.error.clone())
            .unwrap_or(RemediationError::GenerationUnavailable {
                message: "no fallback step was applicable".to_string(),
            });
        Self {
            fingerprint,
            last_error,
            trail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_translation() {
        let transient: RemediationError = LLMError::Timeout(45_000).into();
        assert!(matches!(transient, RemediationError::TransientExternal { service: ExternalService::GenerativeModel, .. }));

        let permanent: RemediationError = LLMError::Authentication("bad key".into()).into();
        assert!(matches!(permanent, RemediationError::PermanentExternal { .. }));
    }

    #[test]
    fn test_legal_text_error_translation() {
        let err: RemediationError = LegalTextError::Http { status: 502, message: "gateway".into() }.into();
        assert!(matches!(err, RemediationError::TransientExternal { service: ExternalService::LegalTextProvider, .. }));
    }

    #[test]
    fn test_terminal_error_skips_cache_outage() {
        let trail = vec![
            StepFailure {
                step: PipelineStep::Generation,
                error: RemediationError::Validation { errors: vec!["unresolved [FIRMA]".into()] },
            },
            StepFailure {
                step: PipelineStep::Cache,
                error: RemediationError::CacheUnavailable { message: "db down".into() },
            },
        ];
        let terminal = TerminalError::from_trail(Fingerprint::from_stored("fp"), trail);
        assert!(matches!(terminal.last_error, RemediationError::Validation { .. }));
        assert_eq!(terminal.trail.len(), 2);
    }

    #[test]
    fn test_terminal_error_with_empty_trail() {
        let terminal = TerminalError::from_trail(Fingerprint::from_stored("fp"), vec![]);
        assert!(matches!(terminal.last_error, RemediationError::GenerationUnavailable { .. }));
    }

    #[test]
    fn test_validation_error_display() {
        let err = RemediationError::Validation { errors: vec!["a".into(), "b".into()] };
        assert_eq!(err.to_string(), "Artifact failed validation: a; b");
    }
}
