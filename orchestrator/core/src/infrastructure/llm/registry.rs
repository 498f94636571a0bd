// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Model Alias Resolution and Call Policy
//
// Resolves model aliases to provider adapters and owns the policy around every
// model call: a process-wide concurrency limit, a per-attempt timeout, and a
// bounded retry loop with exponential backoff for transient failures.

use crate::domain::llm::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use crate::domain::pipeline_config::{resolve_secret, GenerationConfig, LLMProviderConfig, ModelConfig};
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::anthropic::AnthropicAdapter;
use super::openai::OpenAIAdapter;

/// Retry and timeout policy for generative model calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay, doubled after each failed attempt
    pub retry_delay: Duration,
    /// Upper bound for a single attempt
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            request_timeout: config.request_timeout,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

struct RegisteredModel {
    provider_name: String,
    model: String,
    provider: Arc<dyn LLMProvider>,
}

/// Registry for managing LLM providers and resolving model aliases
pub struct ProviderRegistry {
    models: HashMap<String, RegisteredModel>,
    policy: RetryPolicy,
    limiter: Arc<Semaphore>,
}

impl ProviderRegistry {
    /// Empty registry; every `generate` call fails with `ModelNotFound` until
    /// an alias is registered.
    pub fn new(policy: RetryPolicy, max_concurrency: usize) -> Self {
        Self {
            models: HashMap::new(),
            policy,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Create provider registry from the generation configuration
    pub fn from_config(config: &GenerationConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new(RetryPolicy::from_config(config), config.max_concurrency);

        info!("Initializing LLM provider registry");

        for provider_config in &config.providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            for model_config in &provider_config.models {
                match Self::create_provider(provider_config, model_config) {
                    Ok(provider) => {
                        info!(
                            "Mapping alias '{}' -> {} ({})",
                            model_config.alias, model_config.model, provider_config.name
                        );
                        registry.register(
                            &model_config.alias,
                            &provider_config.name,
                            &model_config.model,
                            provider,
                        );
                    }
                    Err(e) => {
                        warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                    }
                }
            }
        }

        if registry.is_empty() {
            warn!("No LLM providers configured - fixes will come from cache and templates only");
        }

        Ok(registry)
    }

    /// Create a provider instance bound to one model
    fn create_provider(
        config: &LLMProviderConfig,
        model: &ModelConfig,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let api_key = match &config.api_key {
            Some(key) => resolve_secret(key)?,
            None => String::new(),
        };

        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "anthropic" => Arc::new(AnthropicAdapter::new(
                config.endpoint.clone(),
                api_key,
                model.model.clone(),
            )),
            "openai" | "openai-compatible" => Arc::new(
                OpenAIAdapter::new(config.endpoint.clone(), api_key, model.model.clone())
                    .with_provider_name(config.name.clone()),
            ),
            _ => anyhow::bail!("Unsupported provider type: {}", config.provider_type),
        };

        Ok(provider)
    }

    /// Register (or replace) the provider behind an alias.
    pub fn register(
        &mut self,
        alias: &str,
        provider_name: &str,
        model: &str,
        provider: Arc<dyn LLMProvider>,
    ) {
        self.models.insert(
            alias.to_string(),
            RegisteredModel {
                provider_name: provider_name.to_string(),
                model: model.to_string(),
                provider,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Generate text using a model alias.
    ///
    /// Makes at most `max_retries + 1` attempts. Only transient errors are
    /// retried; a permanent error returns immediately. `on_failure` sees every
    /// failed attempt with its 1-based number.
    pub async fn generate<F>(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
        mut on_failure: F,
    ) -> Result<GenerationResponse, LLMError>
    where
        F: FnMut(u32, &LLMError) + Send,
    {
        let registered = self
            .models
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("Model alias '{}' not found", alias)))?;

        let max_attempts = self.policy.max_retries + 1;

        for attempt in 1..=max_attempts {
            match self.attempt(registered, prompt, options).await {
                Ok(response) => {
                    counter!("remedy_generation_attempts_total", "outcome" => "success").increment(1);
                    info!(
                        provider = %registered.provider_name,
                        model = %response.model,
                        tokens = response.usage.total_tokens,
                        "Generation successful on attempt {}",
                        attempt
                    );
                    return Ok(response);
                }
                Err(e) => {
                    let transient = e.is_transient();
                    let outcome = if transient { "transient_error" } else { "permanent_error" };
                    counter!("remedy_generation_attempts_total", "outcome" => outcome).increment(1);
                    warn!(
                        provider = %registered.provider_name,
                        transient,
                        "Generation failed (attempt {}/{}): {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    on_failure(attempt, &e);

                    if !transient || attempt == max_attempts {
                        return Err(e);
                    }

                    // The permit was released with the failed attempt
                    tokio::time::sleep(self.policy.backoff(attempt)).await;
                }
            }
        }

        Err(LLMError::Provider("Retry loop exited without a result".into()))
    }

    /// One admitted, time-bounded call.
    async fn attempt(
        &self,
        registered: &RegisteredModel,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| LLMError::Provider("Concurrency limiter closed".into()))?;

        match tokio::time::timeout(
            self.policy.request_timeout,
            registered.provider.generate(prompt, options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout(self.policy.request_timeout.as_millis() as u64)),
        }
    }

    /// Check if a model alias exists
    pub fn has_alias(&self, alias: &str) -> bool {
        self.models.contains_key(alias)
    }
}
