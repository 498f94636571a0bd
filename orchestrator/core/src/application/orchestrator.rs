// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Generation Orchestrator
//
// Runs the fallback chain for one fix request and stops at the first valid
// artifact:
//
//   1. authoritative legal-text provider (routes flagged `authoritative`)
//   2. solution cache, exact then fuzzy
//   3. template, when the route prefers it
//   4. generative model with bounded retries and one regeneration
//   5. template, when it was not tried in step 3
//
// Every failure is recorded as a StepFailure; the caller receives either a
// validated FixArtifact or a TerminalError carrying the trail. Only freshly
// generated artifacts are written to the cache, and only after validation.

use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::artifact_validator::ArtifactValidator;
use crate::application::solution_cache::SolutionCache;
use crate::domain::artifact::{ArtifactBody, DocumentType, FixArtifact, FixSource};
use crate::domain::errors::{PipelineStep, RemediationError, StepFailure, TerminalError};
use crate::domain::events::RemediationEvent;
use crate::domain::fingerprint::{Fingerprint, IssueFingerprinter};
use crate::domain::issue::StructuredIssue;
use crate::domain::legal_text::{LegalTextError, LegalTextProvider};
use crate::domain::llm::GenerationOptions;
use crate::domain::pipeline_config::{FixRoute, PipelineConfigSpec, RoutingConfig};
use crate::domain::repository::RepositoryError;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::fix_templates::TemplateCatalog;
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::prompt_template_engine::{PromptContext, PromptTemplateEngine};

const AUTHORITATIVE_INSTRUCTIONS: &str =
    "Veröffentlichen Sie den Text unverändert auf einer eigenen Unterseite und verlinken Sie diese im Footer jeder Seite.";

/// Validation rounds per generation step: the first answer plus one regeneration.
const GENERATION_ROUNDS: u32 = 2;

/// Tunables the orchestrator reads on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub model_alias: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub regeneration_temperature: f32,
    pub generated_confidence: f64,
    pub template_confidence: f64,
    pub authoritative_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_spec(spec: &PipelineConfigSpec) -> Self {
        Self {
            model_alias: spec.generation.default_model.clone(),
            max_tokens: spec.generation.max_tokens,
            temperature: spec.generation.temperature,
            regeneration_temperature: spec.generation.regeneration_temperature,
            generated_confidence: spec.cache.initial_success_rate,
            template_confidence: spec.templates.template_confidence,
            authoritative_timeout: spec
                .authoritative
                .as_ref()
                .map(|a| a.timeout)
                .unwrap_or(Duration::from_secs(30)),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_spec(&PipelineConfigSpec::default())
    }
}

pub struct GenerationOrchestrator {
    cache: Arc<SolutionCache>,
    validator: ArtifactValidator,
    registry: Arc<ProviderRegistry>,
    legal_text: Option<Arc<dyn LegalTextProvider>>,
    templates: Arc<TemplateCatalog>,
    prompts: PromptTemplateEngine,
    routing: RoutingConfig,
    settings: OrchestratorSettings,
    event_bus: Arc<EventBus>,
}

impl GenerationOrchestrator {
    pub fn new(
        cache: Arc<SolutionCache>,
        registry: Arc<ProviderRegistry>,
        templates: Arc<TemplateCatalog>,
        routing: RoutingConfig,
        settings: OrchestratorSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            cache,
            validator: ArtifactValidator::new(),
            registry,
            legal_text: None,
            templates,
            prompts: PromptTemplateEngine::new(),
            routing,
            settings,
            event_bus,
        }
    }

    pub fn with_legal_text_provider(mut self, provider: Arc<dyn LegalTextProvider>) -> Self {
        self.legal_text = Some(provider);
        self
    }

    pub fn cache(&self) -> &Arc<SolutionCache> {
        &self.cache
    }

    /// Produce a validated fix for `issue`, or the terminal error once every
    /// applicable source has failed.
    pub async fn process(&self, issue: &StructuredIssue) -> Result<FixArtifact, TerminalError> {
        let request_id = Uuid::new_v4();
        let fingerprint = IssueFingerprinter::for_issue(issue);
        let span = info_span!(
            "fix_request",
            %request_id,
            fingerprint = %fingerprint,
            category = %issue.category
        );

        self.run(request_id, fingerprint, issue).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        fingerprint: Fingerprint,
        issue: &StructuredIssue,
    ) -> Result<FixArtifact, TerminalError> {
        let route = self.routing.route_for(issue.category.as_str()).clone();
        let mut trail: Vec<StepFailure> = Vec::new();

        debug!(fix_type = %route.fix_type, "Processing fix request");

        if let Some(outcome) = self.try_authoritative(&fingerprint, issue, &route).await {
            match outcome {
                Ok(artifact) => return Ok(self.serve(request_id, issue, artifact)),
                Err(error) => trail.push(StepFailure {
                    step: PipelineStep::Authoritative,
                    error,
                }),
            }
        }

        let mut cache_available = true;
        match self.lookup_cache(&fingerprint, issue).await {
            Ok(Some(artifact)) => return Ok(self.serve(request_id, issue, artifact)),
            Ok(None) => {}
            Err(e) => {
                cache_available = false;
                self.degrade("lookup", &e);
                trail.push(StepFailure {
                    step: PipelineStep::Cache,
                    error: e.into(),
                });
            }
        }

        if route.prefer_template {
            match self.try_template(&fingerprint, issue, &route) {
                Ok(artifact) => return Ok(self.serve(request_id, issue, artifact)),
                Err(error) => trail.push(StepFailure {
                    step: PipelineStep::Template,
                    error,
                }),
            }
        }

        match self.try_generation(&fingerprint, issue, &route, cache_available).await {
            Ok(artifact) => return Ok(self.serve(request_id, issue, artifact)),
            Err(error) => trail.push(StepFailure {
                step: PipelineStep::Generation,
                error,
            }),
        }

        if !route.prefer_template {
            match self.try_template(&fingerprint, issue, &route) {
                Ok(artifact) => return Ok(self.serve(request_id, issue, artifact)),
                Err(error) => trail.push(StepFailure {
                    step: PipelineStep::Template,
                    error,
                }),
            }
        }

        let terminal = TerminalError::from_trail(fingerprint, trail);
        counter!("remedy_fix_requests_total", "source" => "failed").increment(1);
        warn!(steps = terminal.trail.len(), "No valid fix: {}", terminal.last_error);
        self.event_bus.publish(RemediationEvent::FixRequestFailed {
            request_id,
            fingerprint: terminal.fingerprint.clone(),
            error: terminal.last_error.to_string(),
            timestamp: Utc::now(),
        });
        Err(terminal)
    }

    fn serve(&self, request_id: Uuid, issue: &StructuredIssue, artifact: FixArtifact) -> FixArtifact {
        counter!("remedy_fix_requests_total", "source" => artifact.source.as_str()).increment(1);
        info!(
            source = %artifact.source,
            confidence = artifact.confidence,
            "Serving fix"
        );
        self.event_bus.publish(RemediationEvent::FixServed {
            request_id,
            fingerprint: artifact.fingerprint.clone(),
            category: issue.category.to_string(),
            source: artifact.source,
            confidence: artifact.confidence,
            timestamp: Utc::now(),
        });
        artifact
    }

    /// `None` when the route does not use the authoritative provider or no
    /// provider is configured.
    async fn try_authoritative(
        &self,
        fingerprint: &Fingerprint,
        issue: &StructuredIssue,
        route: &FixRoute,
    ) -> Option<Result<FixArtifact, RemediationError>> {
        if !route.authoritative {
            return None;
        }
        let (provider, document_type) = match (&self.legal_text, route.document_type) {
            (Some(provider), Some(document_type)) => (provider, document_type),
            _ => return None,
        };

        Some(
            self.request_authoritative(provider.as_ref(), document_type, fingerprint, issue, route)
                .await,
        )
    }

    async fn request_authoritative(
        &self,
        provider: &dyn LegalTextProvider,
        document_type: DocumentType,
        fingerprint: &Fingerprint,
        issue: &StructuredIssue,
        route: &FixRoute,
    ) -> Result<FixArtifact, RemediationError> {
        let timeout = self.settings.authoritative_timeout;
        let text = match tokio::time::timeout(timeout, provider.request(document_type, &issue.context)).await {
            Ok(result) => result,
            Err(_) => Err(LegalTextError::Timeout(timeout.as_millis() as u64)),
        }
        .map_err(|e| {
            warn!(%document_type, "Authoritative provider failed: {}", e);
            RemediationError::from(e)
        })?;

        let body = ArtifactBody::new(text, AUTHORITATIVE_INSTRUCTIONS);
        self.check(&body, route)?;

        Ok(FixArtifact::from_body(
            body,
            route.fix_type,
            FixSource::Authoritative,
            1.0,
            fingerprint.clone(),
        ))
    }

    async fn lookup_cache(
        &self,
        fingerprint: &Fingerprint,
        issue: &StructuredIssue,
    ) -> Result<Option<FixArtifact>, RepositoryError> {
        if let Some(entry) = self.cache.exact_lookup(fingerprint).await? {
            let confidence = entry.success_rate;
            return Ok(Some(
                FixArtifact::from_body(
                    entry.artifact,
                    entry.fix_type,
                    FixSource::CacheExact,
                    confidence,
                    fingerprint.clone(),
                )
                .with_model(entry.model_used),
            ));
        }

        let fuzzy = self
            .cache
            .fuzzy_lookup(issue.category.as_str(), &issue.title, &issue.description)
            .await?;

        Ok(fuzzy.map(|hit| {
            debug!(matched = %hit.entry.fingerprint, score = hit.score, "Serving near-duplicate");
            FixArtifact::from_body(
                hit.entry.artifact,
                hit.entry.fix_type,
                FixSource::CacheFuzzy,
                hit.score,
                fingerprint.clone(),
            )
            .with_model(hit.entry.model_used)
        }))
    }

    fn try_template(
        &self,
        fingerprint: &Fingerprint,
        issue: &StructuredIssue,
        route: &FixRoute,
    ) -> Result<FixArtifact, RemediationError> {
        let body = self.templates.render(issue, route).map_err(|e| {
            warn!("Template rendering failed: {:#}", e);
            RemediationError::Validation {
                errors: vec![format!("template rendering failed: {:#}", e)],
            }
        })?;
        self.check(&body, route)?;

        Ok(FixArtifact::from_body(
            body,
            route.fix_type,
            FixSource::Template,
            self.settings.template_confidence,
            fingerprint.clone(),
        ))
    }

    async fn try_generation(
        &self,
        fingerprint: &Fingerprint,
        issue: &StructuredIssue,
        route: &FixRoute,
        cache_available: bool,
    ) -> Result<FixArtifact, RemediationError> {
        let alias = self.settings.model_alias.as_str();
        if !self.registry.has_alias(alias) {
            return Err(RemediationError::GenerationUnavailable {
                message: format!("no model registered for alias '{}'", alias),
            });
        }

        let mut context = PromptContext::for_issue(issue, route.fix_type, route.document_type);
        let mut temperature = self.settings.temperature;
        let mut rejected: Vec<String> = Vec::new();

        for round in 1..=GENERATION_ROUNDS {
            let prompt = self
                .prompts
                .generation_prompt(&context)
                .map_err(|e| RemediationError::GenerationUnavailable {
                    message: format!("prompt rendering failed: {:#}", e),
                })?;
            let options = GenerationOptions {
                max_tokens: Some(self.settings.max_tokens),
                temperature: Some(temperature),
                stop_sequences: None,
            };

            let event_bus = &self.event_bus;
            let response = self
                .registry
                .generate(alias, &prompt, &options, |attempt, error| {
                    event_bus.publish(RemediationEvent::GenerationAttemptFailed {
                        fingerprint: fingerprint.clone(),
                        attempt,
                        transient: error.is_transient(),
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                })
                .await?;

            let body = match self.validator.parse_generated(&response.text, route.fix_type) {
                Ok(body) => self.check(&body, route).map(|_| body),
                Err(report) => Err(RemediationError::Validation {
                    errors: report.error_messages(),
                }),
            };

            match body {
                Ok(body) => {
                    if cache_available {
                        self.persist(issue, route, &body, &response.model).await;
                    }
                    return Ok(FixArtifact::from_body(
                        body,
                        route.fix_type,
                        FixSource::Generated,
                        self.settings.generated_confidence,
                        fingerprint.clone(),
                    )
                    .with_model(response.model));
                }
                Err(RemediationError::Validation { errors }) => {
                    warn!(round, errors = ?errors, "Generated artifact rejected");
                    self.event_bus.publish(RemediationEvent::ArtifactRejected {
                        fingerprint: fingerprint.clone(),
                        errors: errors.clone(),
                        timestamp: Utc::now(),
                    });
                    context = context.previous_errors(errors.clone());
                    temperature = self.settings.regeneration_temperature;
                    rejected = errors;
                }
                Err(other) => return Err(other),
            }
        }

        Err(RemediationError::Validation { errors: rejected })
    }

    /// Write a validated, generated artifact to the cache. A failing store
    /// degrades the request instead of discarding a valid artifact.
    async fn persist(&self, issue: &StructuredIssue, route: &FixRoute, body: &ArtifactBody, model: &str) {
        match self
            .cache
            .store(&issue.identity(), route.fix_type, body.clone(), model)
            .await
        {
            Ok(entry) => self.event_bus.publish(RemediationEvent::SolutionStored {
                fingerprint: entry.fingerprint,
                category: entry.category,
                model: entry.model_used,
                usage_count: entry.usage_count,
                timestamp: Utc::now(),
            }),
            Err(e) => self.degrade("store", &e),
        }
    }

    fn check(&self, body: &ArtifactBody, route: &FixRoute) -> Result<(), RemediationError> {
        let report = self.validator.validate(body, route.fix_type, route.document_type);
        for warning in &report.warnings {
            debug!(check = ?warning.check, "Validation warning: {}", warning.message);
        }
        if report.is_valid() {
            Ok(())
        } else {
            Err(RemediationError::Validation {
                errors: report.error_messages(),
            })
        }
    }

    fn degrade(&self, operation: &str, error: &RepositoryError) {
        counter!("remedy_cache_degraded_total").increment(1);
        warn!(operation, "Solution cache unavailable, continuing without it: {}", error);
        self.event_bus.publish(RemediationEvent::CacheDegraded {
            operation: operation.to_string(),
            reason: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}
