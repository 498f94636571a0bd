// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remedy_core::application::{GenerationOrchestrator, OrchestratorSettings, SolutionCache};
use remedy_core::domain::artifact::DocumentType;
use remedy_core::domain::cache::{CacheEntry, CacheStats, NewSolution};
use remedy_core::domain::fingerprint::Fingerprint;
use remedy_core::domain::legal_text::{LegalTextError, LegalTextProvider};
use remedy_core::domain::llm::{
    FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage,
};
use remedy_core::domain::pipeline_config::{CacheConfig, RoutingConfig, TemplateConfig};
use remedy_core::domain::repository::{RepositoryError, SolutionRepository, SuccessRateChange};
use remedy_core::infrastructure::event_bus::EventBus;
use remedy_core::infrastructure::fix_templates::TemplateCatalog;
use remedy_core::infrastructure::llm::{ProviderRegistry, RetryPolicy};
use remedy_core::infrastructure::repositories::InMemorySolutionRepository;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MAX_RETRIES: u32 = 2;

pub const PRIVACY_POLICY_JSON: &str = r#"{
  "content": "Datenschutzerklärung\n\nVerantwortlich für die Datenverarbeitung ist die Muster GmbH, Hauptstraße 1, 10115 Berlin.\n\nRechtsgrundlage der Verarbeitung ist Art. 6 Abs. 1 DSGVO.\n\nSpeicherdauer: Personenbezogene Daten werden gelöscht, sobald der Zweck entfällt.\n\nIhre Rechte: Sie haben das Recht auf Auskunft, Berichtigung, Löschung und Widerspruch.",
  "integration_instructions": "Als eigene Seite /datenschutz veröffentlichen und im Footer verlinken."
}"#;

pub const WIDGET_JSON: &str = r#"{"content": "<div class=\"consent\"><p>Wir nutzen Cookies.</p><button type=\"button\">OK</button></div>", "integration_instructions": "Vor </body> einbinden"}"#;

pub const PLACEHOLDER_JSON: &str = r#"{"content": "<div class=\"consent\"><p>[COMPANY NAME] nutzt Cookies.</p></div>", "integration_instructions": "Vor </body> einbinden"}"#;

/// Replies with a fixed outcome and counts every call.
pub struct MockProvider {
    reply: Result<String, LLMError>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: LLMError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map(|text| GenerationResponse {
            text,
            usage: TokenUsage::default(),
            provider: "mock".to_string(),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }
}

/// Legal-text provider with a fixed outcome.
pub struct MockLegalText {
    reply: Result<String, LegalTextError>,
    pub calls: AtomicUsize,
}

impl MockLegalText {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: LegalTextError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LegalTextProvider for MockLegalText {
    async fn request(
        &self,
        _document_type: DocumentType,
        _company_data: &Map<String, Value>,
    ) -> Result<String, LegalTextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// A store whose backend is down.
pub struct UnavailableRepository;

fn down() -> RepositoryError {
    RepositoryError::Database("connection refused".to_string())
}

#[async_trait]
impl SolutionRepository for UnavailableRepository {
    async fn find(&self, _fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, RepositoryError> {
        Err(down())
    }

    async fn record_hit(
        &self,
        _fingerprint: &Fingerprint,
        _min_success_rate: f64,
        _at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, RepositoryError> {
        Err(down())
    }

    async fn candidates(
        &self,
        _category: &str,
        _min_success_rate: f64,
        _limit: usize,
    ) -> Result<Vec<CacheEntry>, RepositoryError> {
        Err(down())
    }

    async fn upsert(
        &self,
        _solution: NewSolution,
        _initial_success_rate: f64,
        _at: DateTime<Utc>,
    ) -> Result<CacheEntry, RepositoryError> {
        Err(down())
    }

    async fn adjust_success_rate(
        &self,
        _fingerprint: &Fingerprint,
        _delta: f64,
        _at: DateTime<Utc>,
    ) -> Result<Option<SuccessRateChange>, RepositoryError> {
        Err(down())
    }

    async fn stats(&self) -> Result<CacheStats, RepositoryError> {
        Err(down())
    }
}

pub struct Harness {
    pub orchestrator: GenerationOrchestrator,
    pub repository: Arc<dyn SolutionRepository>,
    pub cache: Arc<SolutionCache>,
    pub event_bus: Arc<EventBus>,
}

pub struct HarnessBuilder {
    repository: Arc<dyn SolutionRepository>,
    provider: Option<Arc<dyn LLMProvider>>,
    legal_text: Option<Arc<dyn LegalTextProvider>>,
    templates: TemplateConfig,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemorySolutionRepository::new()),
            provider: None,
            legal_text: None,
            templates: TemplateConfig::default(),
        }
    }

    pub fn repository(mut self, repository: Arc<dyn SolutionRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn legal_text(mut self, provider: Arc<dyn LegalTextProvider>) -> Self {
        self.legal_text = Some(provider);
        self
    }

    pub fn templates(mut self, templates: TemplateConfig) -> Self {
        self.templates = templates;
        self
    }

    pub fn build(self) -> Harness {
        let cache = Arc::new(SolutionCache::new(self.repository.clone(), CacheConfig::default()));
        let event_bus = Arc::new(EventBus::with_default_capacity());

        let mut registry = ProviderRegistry::new(
            RetryPolicy {
                max_retries: MAX_RETRIES,
                retry_delay: Duration::from_millis(1),
                request_timeout: Duration::from_secs(5),
            },
            4,
        );
        if let Some(provider) = self.provider {
            registry.register("default", "mock", "mock-model", provider);
        }

        let mut orchestrator = GenerationOrchestrator::new(
            cache.clone(),
            Arc::new(registry),
            Arc::new(TemplateCatalog::new(&self.templates)),
            RoutingConfig::default(),
            OrchestratorSettings::default(),
            event_bus.clone(),
        );
        if let Some(legal_text) = self.legal_text {
            orchestrator = orchestrator.with_legal_text_provider(legal_text);
        }

        Harness {
            orchestrator,
            repository: self.repository,
            cache,
            event_bus,
        }
    }
}
