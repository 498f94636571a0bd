// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Solution Repository Contract
//!
//! Persistence contract for cache entries, keyed by fingerprint. The pipeline
//! relies on each mutating call being an atomic single-row read-modify-write:
//! concurrent hits on one fingerprint must never lose an increment, and a
//! concurrent `upsert` must never overwrite the learned counters.
//!
//! | Implementation | Backing store |
//! |----------------|---------------|
//! | `InMemorySolutionRepository` | `DashMap`, shard lock per row |
//! | `PostgresSolutionRepository` | `solution_cache` table via `sqlx` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::cache::{CacheEntry, CacheStats, NewSolution};
use super::fingerprint::Fingerprint;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

/// Result of a feedback adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuccessRateChange {
    pub previous: f64,
    pub current: f64,
}

#[async_trait]
pub trait SolutionRepository: Send + Sync {
    /// Read an entry without touching its counters.
    async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, RepositoryError>;

    /// Atomically count a hit, but only if the entry's success rate is at least
    /// `min_success_rate`. Returns the entry as it was served, before this
    /// hit was counted, or `None` when the entry is missing or below the
    /// threshold.
    async fn record_hit(
        &self,
        fingerprint: &Fingerprint,
        min_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, RepositoryError>;

    /// Fuzzy-match candidates: same category, success rate at or above the
    /// threshold, ordered by `usage_count` desc then `success_rate` desc,
    /// at most `limit` entries.
    async fn candidates(
        &self,
        category: &str,
        min_success_rate: f64,
        limit: usize,
    ) -> Result<Vec<CacheEntry>, RepositoryError>;

    /// Insert, or merge via [`CacheEntry::merge_regenerated`] when present.
    async fn upsert(
        &self,
        solution: NewSolution,
        initial_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<CacheEntry, RepositoryError>;

    /// Atomically shift the success rate by `delta`, clamped to `[0, 1]`.
    /// `None` when no entry exists.
    async fn adjust_success_rate(
        &self,
        fingerprint: &Fingerprint,
        delta: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<SuccessRateChange>, RepositoryError>;

    async fn stats(&self) -> Result<CacheStats, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}
