// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provides llm functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Generative-model provider interface

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Isolates the pipeline from vendor APIs. Adapters live in infrastructure/llm/,
// retry/timeout/admission policy lives in the ProviderRegistry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;
}

/// Options for LLM generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,

    /// Sequences that stop generation
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.7),
            stop_sequences: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text
    pub text: String,

    /// Token usage stats
    pub usage: TokenUsage,

    /// Provider name (e.g., "openai", "anthropic")
    pub provider: String,

    /// Model used (e.g., "gpt-4o", "claude-sonnet-4")
    pub model: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter
    ContentFilter,
}

/// Errors that can occur during LLM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LLMError {
    /// Timeouts, network failures, 5xx and rate limits may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LLMError::Network(_) | LLMError::Timeout(_) | LLMError::RateLimit | LLMError::Server { .. }
        )
    }

    /// Map a non-success HTTP status from a provider API.
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => LLMError::Authentication(body),
            404 => LLMError::ModelNotFound(model.to_string()),
            429 => LLMError::RateLimit,
            500..=599 => LLMError::Server {
                status,
                message: body,
            },
            400 | 413 | 422 => LLMError::InvalidInput(body),
            _ => LLMError::Provider(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LLMError::Network("reset".into()).is_transient());
        assert!(LLMError::Timeout(30_000).is_transient());
        assert!(LLMError::RateLimit.is_transient());
        assert!(LLMError::Server { status: 503, message: "busy".into() }.is_transient());

        assert!(!LLMError::Authentication("bad key".into()).is_transient());
        assert!(!LLMError::InvalidInput("too long".into()).is_transient());
        assert!(!LLMError::ModelNotFound("x".into()).is_transient());
    }

    #[test]
    fn test_from_status() {
        assert_eq!(LLMError::from_status(429, String::new(), "m"), LLMError::RateLimit);
        assert_eq!(
            LLMError::from_status(401, "nope".into(), "m"),
            LLMError::Authentication("nope".into())
        );
        assert!(matches!(LLMError::from_status(502, String::new(), "m"), LLMError::Server { status: 502, .. }));
        assert!(matches!(LLMError::from_status(400, String::new(), "m"), LLMError::InvalidInput(_)));
        assert_eq!(
            LLMError::from_status(404, String::new(), "gpt-x"),
            LLMError::ModelNotFound("gpt-x".into())
        );
    }
}
