// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Remedy Core
//!
//! Fix caching, fallback orchestration and feedback learning for compliance
//! remediation artifacts.
//!
//! # Architecture
//!
//! - **domain:** issue ingress, fingerprints, artifacts, cache entries, errors, configuration
//! - **application:** SolutionCache, ArtifactValidator, FeedbackLearner, GenerationOrchestrator, batches
//! - **infrastructure:** LLM adapters and registry, legal-text client, repositories, templates, event bus
//! - **presentation:** HTTP API

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
