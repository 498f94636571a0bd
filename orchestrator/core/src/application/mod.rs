// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod artifact_validator;
pub mod batch;
pub mod feedback_learner;
pub mod orchestrator;
pub mod repository_factory;
pub mod solution_cache;

// Re-export services for convenience
pub use artifact_validator::ArtifactValidator;
pub use batch::{process_batch, BatchItem, BatchReport};
pub use feedback_learner::{FeedbackLearner, FeedbackResult};
pub use orchestrator::{GenerationOrchestrator, OrchestratorSettings};
pub use solution_cache::{FuzzyMatch, SolutionCache};
