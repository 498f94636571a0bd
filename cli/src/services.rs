// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wires the pipeline services from a loaded configuration manifest.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use remedy_core::application::repository_factory::create_solution_repository;
use remedy_core::application::{FeedbackLearner, GenerationOrchestrator, OrchestratorSettings, SolutionCache};
use remedy_core::domain::pipeline_config::PipelineConfigManifest;
use remedy_core::infrastructure::{EventBus, HttpLegalTextProvider, TemplateCatalog};
use remedy_core::infrastructure::llm::ProviderRegistry;

pub struct Services {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub feedback: Arc<FeedbackLearner>,
}

pub async fn build(config: &PipelineConfigManifest) -> Result<Services> {
    let spec = &config.spec;

    let backend = spec.storage.to_backend()?;
    let repository = create_solution_repository(&backend)
        .await
        .context("Failed to initialize the solution cache")?;
    let cache = Arc::new(SolutionCache::new(repository.clone(), spec.cache.clone()));
    let event_bus = Arc::new(EventBus::with_default_capacity());

    let registry = ProviderRegistry::from_config(&spec.generation)
        .context("Failed to initialize LLM providers")?;
    if !registry.has_alias(&spec.generation.default_model) {
        warn!(
            alias = %spec.generation.default_model,
            "No provider serves the default model; generation is disabled"
        );
    }

    let templates = TemplateCatalog::new(&spec.templates);
    templates
        .validate_overrides()
        .context("Invalid template override")?;

    let mut orchestrator = GenerationOrchestrator::new(
        cache,
        Arc::new(registry),
        Arc::new(templates),
        spec.routing.clone(),
        OrchestratorSettings::from_spec(spec),
        event_bus.clone(),
    );
    if let Some(authoritative) = &spec.authoritative {
        let provider = HttpLegalTextProvider::from_config(authoritative)
            .context("Failed to initialize the legal-text provider")?;
        info!(endpoint = %authoritative.endpoint, "Authoritative legal-text provider enabled");
        orchestrator = orchestrator.with_legal_text_provider(Arc::new(provider));
    }

    let feedback = FeedbackLearner::new(repository, event_bus, spec.feedback.clone());

    Ok(Services {
        orchestrator: Arc::new(orchestrator),
        feedback: Arc::new(feedback),
    })
}
