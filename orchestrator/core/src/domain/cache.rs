// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Solution Cache Entries
//!
//! A [`CacheEntry`] is a stored fix artifact plus the usage and success
//! bookkeeping learned for it. Invariants held by every mutation below:
//!
//! - `usage_count` starts at 1 and never decreases.
//! - `success_rate` stays inside `[0.0, 1.0]`.
//! - Regeneration replaces content fields only (see [`CacheEntry::merge_regenerated`]).
//!
//! Entries are never deleted by the pipeline; retention is an external concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::artifact::{ArtifactBody, FixType};
use super::fingerprint::Fingerprint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub category: String,
    pub title: String,
    pub description: String,
    pub fix_type: FixType,
    pub artifact: ArtifactBody,
    pub model_used: String,
    pub usage_count: u64,
    pub success_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// Content fields of a freshly validated artifact, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSolution {
    pub fingerprint: Fingerprint,
    pub category: String,
    pub title: String,
    pub description: String,
    pub fix_type: FixType,
    pub artifact: ArtifactBody,
    pub model_used: String,
}

impl CacheEntry {
    /// First write for a fingerprint: one use, optimistic prior.
    pub fn create(solution: NewSolution, initial_success_rate: f64, now: DateTime<Utc>) -> Self {
        Self {
            fingerprint: solution.fingerprint,
            category: solution.category,
            title: solution.title,
            description: solution.description,
            fix_type: solution.fix_type,
            artifact: solution.artifact,
            model_used: solution.model_used,
            usage_count: 1,
            success_rate: initial_success_rate.clamp(0.0, 1.0),
            created_at: now,
            updated_at: now,
            last_used_at: now,
        }
    }

    /// Upsert merge for a regeneration of an existing fingerprint.
    ///
    /// Content and model are last-writer-wins; `usage_count`, `success_rate`,
    /// `created_at` and `last_used_at` are carried over from the existing row.
    pub fn merge_regenerated(&self, solution: NewSolution, now: DateTime<Utc>) -> Self {
        Self {
            fingerprint: self.fingerprint.clone(),
            category: solution.category,
            title: solution.title,
            description: solution.description,
            fix_type: solution.fix_type,
            artifact: solution.artifact,
            model_used: solution.model_used,
            usage_count: self.usage_count,
            success_rate: self.success_rate,
            created_at: self.created_at,
            updated_at: now,
            last_used_at: self.last_used_at,
        }
    }

    pub fn record_hit(&mut self, now: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used_at = now;
    }

    /// Shift the success rate by `delta`, clamped to `[0, 1]`. Returns `(old, new)`.
    pub fn adjust_success_rate(&mut self, delta: f64, now: DateTime<Utc>) -> (f64, f64) {
        let old = self.success_rate;
        self.success_rate = (old + delta).clamp(0.0, 1.0);
        self.updated_at = now;
        (old, self.success_rate)
    }
}

/// Aggregate counters for the administrative endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: u64,
    /// Sum of `usage_count` over all entries (creation counts as one use)
    pub total_usage: u64,
    /// Uses served from the cache, i.e. usage beyond the creating request
    pub total_hits: u64,
    pub average_success_rate: f64,
    pub categories: BTreeMap<String, CategoryStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub entries: u64,
    pub hits: u64,
    pub average_success_rate: f64,
}

impl CacheStats {
    /// Fold a snapshot of entries into aggregate counters.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> Self {
        let mut stats = CacheStats::default();
        let mut rate_sum = 0.0;
        let mut category_rate_sums: BTreeMap<String, f64> = BTreeMap::new();

        for entry in entries {
            let hits = entry.usage_count.saturating_sub(1);
            stats.total_entries += 1;
            stats.total_usage += entry.usage_count;
            stats.total_hits += hits;
            rate_sum += entry.success_rate;

            let category = stats.categories.entry(entry.category.clone()).or_default();
            category.entries += 1;
            category.hits += hits;
            *category_rate_sums.entry(entry.category.clone()).or_default() += entry.success_rate;
        }

        if stats.total_entries > 0 {
            stats.average_success_rate = rate_sum / stats.total_entries as f64;
        }
        for (name, category) in stats.categories.iter_mut() {
            let sum = category_rate_sums.get(name).copied().unwrap_or_default();
            category.average_success_rate = sum / category.entries as f64;
        }
        stats
    }
}
