// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `SolutionRepository` contract.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve cache entries
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresSolutionRepository** - `solution_cache` table, row-level atomic updates
//! - **InMemorySolutionRepository** - `DashMap`-backed storage for tests and single-process use
//!
//! # Design Principles
//!
//! 1. **Technology Agnostic**: Domain layer has no knowledge of persistence
//! 2. **Row Atomicity**: Every mutation is a single read-modify-write on one row
//! 3. **Error Mapping**: Infrastructure errors mapped to domain RepositoryError

pub mod postgres_solution;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::domain::cache::{CacheEntry, CacheStats, NewSolution};
use crate::domain::fingerprint::Fingerprint;
use crate::domain::repository::{RepositoryError, SolutionRepository, SuccessRateChange};

pub use postgres_solution::PostgresSolutionRepository;

/// Entries keyed by fingerprint. Each mutation runs under the shard lock of
/// its key, which makes it atomic with respect to every other call on that key.
#[derive(Clone, Default)]
pub struct InMemorySolutionRepository {
    entries: Arc<DashMap<Fingerprint, CacheEntry>>,
}

impl InMemorySolutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SolutionRepository for InMemorySolutionRepository {
    async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, RepositoryError> {
        Ok(self.entries.get(fingerprint).map(|e| e.value().clone()))
    }

    async fn record_hit(
        &self,
        fingerprint: &Fingerprint,
        min_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, RepositoryError> {
        let Some(mut entry) = self.entries.get_mut(fingerprint) else {
            return Ok(None);
        };
        if entry.success_rate < min_success_rate {
            return Ok(None);
        }
        let served = entry.clone();
        entry.record_hit(at);
        Ok(Some(served))
    }

    async fn candidates(
        &self,
        category: &str,
        min_success_rate: f64,
        limit: usize,
    ) -> Result<Vec<CacheEntry>, RepositoryError> {
        let mut matching: Vec<CacheEntry> = self
            .entries
            .iter()
            .filter(|e| e.category == category && e.success_rate >= min_success_rate)
            .map(|e| e.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| b.success_rate.total_cmp(&a.success_rate))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn upsert(
        &self,
        solution: NewSolution,
        initial_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<CacheEntry, RepositoryError> {
        let stored = match self.entries.entry(solution.fingerprint.clone()) {
            Entry::Occupied(mut occupied) => {
                let merged = occupied.get().merge_regenerated(solution, at);
                occupied.insert(merged.clone());
                merged
            }
            Entry::Vacant(vacant) => {
                let created = CacheEntry::create(solution, initial_success_rate, at);
                vacant.insert(created.clone());
                created
            }
        };
        Ok(stored)
    }

    async fn adjust_success_rate(
        &self,
        fingerprint: &Fingerprint,
        delta: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<SuccessRateChange>, RepositoryError> {
        Ok(self.entries.get_mut(fingerprint).map(|mut entry| {
            let (previous, current) = entry.adjust_success_rate(delta, at);
            SuccessRateChange { previous, current }
        }))
    }

    async fn stats(&self) -> Result<CacheStats, RepositoryError> {
        let snapshot: Vec<CacheEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        Ok(CacheStats::from_entries(&snapshot))
    }
}
