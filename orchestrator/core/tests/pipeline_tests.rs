// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use common::*;
use remedy_core::application::{ArtifactValidator, FeedbackLearner, FeedbackResult};
use remedy_core::domain::artifact::{DocumentType, FixSource, FixType};
use remedy_core::domain::errors::{ExternalService, PipelineStep, RemediationError};
use remedy_core::domain::events::RemediationEvent;
use remedy_core::domain::feedback::{FeedbackEvent, FeedbackOutcome};
use remedy_core::domain::fingerprint::IssueFingerprinter;
use remedy_core::domain::issue::StructuredIssue;
use remedy_core::domain::legal_text::LegalTextError;
use remedy_core::domain::llm::LLMError;
use remedy_core::domain::pipeline_config::{FeedbackConfig, TemplateConfig, TemplateOverride};
use std::sync::Arc;

fn datenschutz_issue() -> StructuredIssue {
    StructuredIssue::new("datenschutz", "Fehlende Datenschutzerklärung", "keine Seite gefunden").unwrap()
}

fn cookie_issue() -> StructuredIssue {
    StructuredIssue::new("cookies", "Kein Cookie-Banner", "Tracking ohne Einwilligung").unwrap()
}

#[tokio::test]
async fn test_end_to_end_generation_then_exact_hit() {
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new().provider(provider.clone()).build();
    let mut events = harness.event_bus.subscribe();
    let issue = datenschutz_issue();

    let first = harness.orchestrator.process(&issue).await.unwrap();

    assert_eq!(first.source, FixSource::Generated);
    assert_eq!(first.fix_type, FixType::Text);
    assert_eq!(first.fingerprint, IssueFingerprinter::for_issue(&issue));
    let report = ArtifactValidator::new().validate(&first.body(), FixType::Text, Some(DocumentType::PrivacyPolicy));
    assert!(report.is_valid());
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let stored = harness.repository.find(&first.fingerprint).await.unwrap().unwrap();
    assert_eq!(stored.usage_count, 1);
    assert_eq!(stored.success_rate, 0.8);
    assert_eq!(stored.model_used, "mock-model");

    let second = harness.orchestrator.process(&issue).await.unwrap();

    assert_eq!(second.source, FixSource::CacheExact);
    assert_eq!(second.content, first.content);
    assert_eq!(second.integration_instructions, first.integration_instructions);
    assert_eq!(provider.calls(), 1);

    let entry = harness.repository.find(&first.fingerprint).await.unwrap().unwrap();
    assert_eq!(entry.usage_count, 2);

    let types: Vec<&str> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["solution_stored", "fix_served", "fix_served"]);
}

#[tokio::test]
async fn test_transient_failures_exhaust_retries_then_template() {
    let provider = MockProvider::failing(LLMError::Server {
        status: 503,
        message: "overloaded".into(),
    });
    let harness = HarnessBuilder::new().provider(provider.clone()).build();
    let mut events = harness.event_bus.subscribe();

    let artifact = harness.orchestrator.process(&cookie_issue()).await.unwrap();

    assert_eq!(provider.calls(), (MAX_RETRIES + 1) as usize);
    assert_eq!(artifact.source, FixSource::Template);
    assert_eq!(artifact.confidence, 0.5);
    assert_eq!(harness.cache.get_stats().await.unwrap().total_entries, 0);

    let failed_attempts: Vec<u32> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            RemediationEvent::GenerationAttemptFailed { attempt, transient, .. } => {
                assert!(transient);
                Some(attempt)
            }
            _ => None,
        })
        .collect();
    assert_eq!(failed_attempts, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_placeholder_artifact_is_never_served_as_generated() {
    let provider = MockProvider::replying(PLACEHOLDER_JSON);
    let harness = HarnessBuilder::new().provider(provider.clone()).build();
    let mut events = harness.event_bus.subscribe();

    let artifact = harness.orchestrator.process(&cookie_issue()).await.unwrap();

    assert_ne!(artifact.source, FixSource::Generated);
    assert!(!artifact.content.contains("[COMPANY NAME]"));
    // first answer plus one regeneration
    assert_eq!(provider.calls(), 2);
    assert_eq!(harness.cache.get_stats().await.unwrap().total_entries, 0);

    let rejections = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, RemediationEvent::ArtifactRejected { .. }))
        .count();
    assert_eq!(rejections, 2);
}

#[tokio::test]
async fn test_terminal_error_carries_last_actionable_error() {
    let mut templates = TemplateConfig::default();
    templates.overrides.insert(
        "cookies".into(),
        TemplateOverride {
            content: "<div>[FIRMA] nutzt Cookies</div>".into(),
            integration_instructions: "einbinden".into(),
        },
    );
    let provider = MockProvider::failing(LLMError::RateLimit);
    let harness = HarnessBuilder::new()
        .provider(provider.clone())
        .templates(templates)
        .build();
    let mut events = harness.event_bus.subscribe();

    let terminal = harness.orchestrator.process(&cookie_issue()).await.unwrap_err();

    assert_eq!(terminal.fingerprint, IssueFingerprinter::for_issue(&cookie_issue()));
    let steps: Vec<PipelineStep> = terminal.trail.iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![PipelineStep::Generation, PipelineStep::Template]);
    assert!(matches!(
        terminal.trail[0].error,
        RemediationError::TransientExternal {
            service: ExternalService::GenerativeModel,
            ..
        }
    ));
    assert!(matches!(terminal.last_error, RemediationError::Validation { .. }));

    let failed = events
        .drain()
        .into_iter()
        .any(|e| matches!(e, RemediationEvent::FixRequestFailed { .. }));
    assert!(failed);
}

#[tokio::test]
async fn test_preferred_template_failure_then_permanent_generation_error() {
    let mut templates = TemplateConfig::default();
    templates.overrides.insert(
        "ssl".into(),
        TemplateOverride {
            content: "1. [Ihre Domain] im Hosting-Panel auswählen".into(),
            integration_instructions: String::new(),
        },
    );
    let provider = MockProvider::failing(LLMError::Authentication("invalid key".into()));
    let harness = HarnessBuilder::new()
        .provider(provider.clone())
        .templates(templates)
        .build();
    let issue = StructuredIssue::new("ssl", "Zertifikat abgelaufen", "").unwrap();

    let terminal = harness.orchestrator.process(&issue).await.unwrap_err();

    assert_eq!(provider.calls(), 1);
    let steps: Vec<PipelineStep> = terminal.trail.iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![PipelineStep::Template, PipelineStep::Generation]);
    assert!(matches!(terminal.last_error, RemediationError::PermanentExternal { .. }));
}

#[tokio::test]
async fn test_cache_outage_degrades_to_direct_generation() {
    let provider = MockProvider::replying(WIDGET_JSON);
    let harness = HarnessBuilder::new()
        .repository(Arc::new(UnavailableRepository))
        .provider(provider.clone())
        .build();
    let mut events = harness.event_bus.subscribe();

    let artifact = harness.orchestrator.process(&cookie_issue()).await.unwrap();

    assert_eq!(artifact.source, FixSource::Generated);
    assert_eq!(provider.calls(), 1);

    let degraded: Vec<String> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            RemediationEvent::CacheDegraded { operation, .. } => Some(operation),
            _ => None,
        })
        .collect();
    // lookup failed, so no store is attempted
    assert_eq!(degraded, vec!["lookup".to_string()]);
}

#[tokio::test]
async fn test_authoritative_text_bypasses_cache() {
    let legal_text = MockLegalText::replying(
        "Datenschutzerklärung der Muster GmbH. Verantwortlich ist die Muster GmbH. \
         Rechtsgrundlage ist Art. 6 DSGVO. Daten werden gelöscht, sobald der Zweck entfällt. \
         Sie haben ein Recht auf Auskunft und Widerspruch gegenüber der Muster GmbH.",
    );
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new()
        .provider(provider.clone())
        .legal_text(legal_text)
        .build();

    let artifact = harness.orchestrator.process(&datenschutz_issue()).await.unwrap();

    assert_eq!(artifact.source, FixSource::Authoritative);
    assert_eq!(artifact.confidence, 1.0);
    assert!(artifact.content.starts_with("Datenschutzerklärung der Muster GmbH"));
    assert_eq!(provider.calls(), 0);
    assert_eq!(harness.cache.get_stats().await.unwrap().total_entries, 0);
}

#[tokio::test]
async fn test_authoritative_failure_falls_through_to_generation() {
    let legal_text = MockLegalText::failing(LegalTextError::Http {
        status: 503,
        message: "maintenance".into(),
    });
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new()
        .provider(provider.clone())
        .legal_text(legal_text.clone())
        .build();

    let artifact = harness.orchestrator.process(&datenschutz_issue()).await.unwrap();

    assert_eq!(artifact.source, FixSource::Generated);
    assert_eq!(legal_text.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(harness.cache.get_stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_authoritative_is_skipped_for_non_legal_routes() {
    let legal_text = MockLegalText::replying("irrelevant");
    let provider = MockProvider::replying(WIDGET_JSON);
    let harness = HarnessBuilder::new()
        .provider(provider)
        .legal_text(legal_text.clone())
        .build();

    let artifact = harness.orchestrator.process(&cookie_issue()).await.unwrap();

    assert_eq!(artifact.source, FixSource::Generated);
    assert_eq!(legal_text.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_near_duplicate_is_served_from_fuzzy_cache() {
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new().provider(provider.clone()).build();

    let original = harness.orchestrator.process(&datenschutz_issue()).await.unwrap();
    let reworded =
        StructuredIssue::new("datenschutz", "Fehlende Datenschutzerklärung!", "keine Seite gefunden").unwrap();

    let artifact = harness.orchestrator.process(&reworded).await.unwrap();

    assert_eq!(artifact.source, FixSource::CacheFuzzy);
    assert_eq!(artifact.content, original.content);
    assert!(artifact.confidence >= 0.85);
    assert_eq!(provider.calls(), 1);

    let entry = harness.repository.find(&original.fingerprint).await.unwrap().unwrap();
    assert_eq!(entry.usage_count, 2);
}

#[tokio::test]
async fn test_other_category_is_not_a_fuzzy_candidate() {
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new().provider(provider.clone()).build();

    harness.orchestrator.process(&datenschutz_issue()).await.unwrap();
    let same_words = StructuredIssue::new("privacy", "Fehlende Datenschutzerklärung", "keine Seite gefunden").unwrap();
    let artifact = harness.orchestrator.process(&same_words).await.unwrap();

    assert_eq!(artifact.source, FixSource::Generated);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_negative_feedback_forces_regeneration_without_resetting_history() {
    let provider = MockProvider::replying(PRIVACY_POLICY_JSON);
    let harness = HarnessBuilder::new().provider(provider.clone()).build();
    let learner = FeedbackLearner::new(
        harness.repository.clone(),
        harness.event_bus.clone(),
        FeedbackConfig::default(),
    );
    let issue = datenschutz_issue();

    harness.orchestrator.process(&issue).await.unwrap();
    for _ in 0..2 {
        let feedback = FeedbackEvent {
            issue: issue.identity(),
            outcome: FeedbackOutcome::Negative,
            timestamp: chrono::Utc::now(),
        };
        learner.record_feedback(&feedback).await.unwrap();
    }

    let artifact = harness.orchestrator.process(&issue).await.unwrap();
    assert_eq!(artifact.source, FixSource::Generated);
    assert_eq!(provider.calls(), 2);

    let entry = harness.repository.find(&artifact.fingerprint).await.unwrap().unwrap();
    assert_eq!(entry.usage_count, 1);
    assert!((entry.success_rate - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_feedback_saturates_and_floors() {
    let harness = HarnessBuilder::new()
        .provider(MockProvider::replying(PRIVACY_POLICY_JSON))
        .build();
    let learner = FeedbackLearner::new(
        harness.repository.clone(),
        harness.event_bus.clone(),
        FeedbackConfig::default(),
    );
    let issue = datenschutz_issue();
    harness.orchestrator.process(&issue).await.unwrap();

    let feedback = |outcome| FeedbackEvent {
        issue: issue.identity(),
        outcome,
        timestamp: chrono::Utc::now(),
    };

    let mut last = None;
    for _ in 0..5 {
        last = Some(learner.record_feedback(&feedback(FeedbackOutcome::Positive)).await.unwrap());
    }
    assert!(matches!(last, Some(FeedbackResult::Applied { success_rate, .. }) if success_rate == 1.0));

    for _ in 0..8 {
        last = Some(learner.record_feedback(&feedback(FeedbackOutcome::Negative)).await.unwrap());
    }
    assert!(matches!(last, Some(FeedbackResult::Applied { success_rate, .. }) if success_rate == 0.0));

    let unknown = FeedbackEvent {
        issue: StructuredIssue::new("agb", "Keine AGB", "").unwrap().identity(),
        outcome: FeedbackOutcome::Positive,
        timestamp: chrono::Utc::now(),
    };
    let result = learner.record_feedback(&unknown).await.unwrap();
    assert!(matches!(result, FeedbackResult::NoEntry { .. }));
    assert_eq!(harness.cache.get_stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_concurrent_identical_requests_count_every_hit() {
    let harness = HarnessBuilder::new()
        .provider(MockProvider::replying(WIDGET_JSON))
        .build();
    let issue = cookie_issue();
    let first = harness.orchestrator.process(&issue).await.unwrap();

    let results = futures::future::join_all((0..16).map(|_| harness.orchestrator.process(&issue))).await;

    assert!(results
        .iter()
        .all(|r| matches!(r, Ok(a) if a.source == FixSource::CacheExact)));
    let entry = harness.repository.find(&first.fingerprint).await.unwrap().unwrap();
    assert_eq!(entry.usage_count, 17);
}
