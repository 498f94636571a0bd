// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates the concrete `SolutionRepository` for the configured storage backend,
//! keeping the domain layer free of infrastructure dependencies.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select and bootstrap the persistence adapter

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::domain::repository::{SolutionRepository, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{InMemorySolutionRepository, PostgresSolutionRepository};

/// Creates a SolutionRepository implementation based on the configured backend.
/// The PostgreSQL schema is created if it does not exist.
pub async fn create_solution_repository(backend: &StorageBackend) -> Result<Arc<dyn SolutionRepository>> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory solution cache");
            Ok(Arc::new(InMemorySolutionRepository::new()))
        }
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(&config.connection_string).await?;
            let repository = PostgresSolutionRepository::new(database.get_pool().clone());
            repository
                .ensure_schema()
                .await
                .context("Failed to bootstrap the solution_cache schema")?;
            info!("Using PostgreSQL solution cache");
            Ok(Arc::new(repository))
        }
    }
}
