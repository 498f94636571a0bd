// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects and collaborator contracts of the remediation pipeline.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O

pub mod artifact;
pub mod cache;
pub mod errors;
pub mod events;
pub mod feedback;
pub mod fingerprint;
pub mod issue;
pub mod legal_text;
pub mod llm;
pub mod pipeline_config;
pub mod repository;
pub mod similarity;
pub mod validation;
