// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Solution Cache Service
//
// Content-addressable store of validated fixes with exact and fuzzy lookup.
// Identity always comes from IssueFingerprinter; the repository guarantees the
// per-row atomicity the hit and feedback counters depend on.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::artifact::{ArtifactBody, FixType};
use crate::domain::cache::{CacheEntry, CacheStats, NewSolution};
use crate::domain::fingerprint::{Fingerprint, IssueFingerprinter};
use crate::domain::issue::IssueIdentity;
use crate::domain::pipeline_config::CacheConfig;
use crate::domain::repository::{RepositoryError, SolutionRepository};
use crate::domain::similarity::{combined_score, similarity, SimilarityWeights};

/// A fuzzy hit together with the score that admitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub entry: CacheEntry,
    pub score: f64,
}

pub struct SolutionCache {
    repository: Arc<dyn SolutionRepository>,
    config: CacheConfig,
}

impl SolutionCache {
    pub fn new(repository: Arc<dyn SolutionRepository>, config: CacheConfig) -> Self {
        Self { repository, config }
    }

    /// Serve the entry for `fingerprint` if it is trusted enough, counting the hit.
    pub async fn exact_lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, RepositoryError> {
        let hit = self
            .repository
            .record_hit(fingerprint, self.config.min_success_rate, Utc::now())
            .await?;

        match &hit {
            Some(entry) => debug!(
                fingerprint = %fingerprint,
                usage_count = entry.usage_count,
                success_rate = entry.success_rate,
                "Exact cache hit"
            ),
            None => debug!(fingerprint = %fingerprint, "Exact cache miss"),
        }

        Ok(hit)
    }

    /// Best near-duplicate in the same category, accepted at or above the
    /// similarity threshold. An accepted match is counted like an exact hit.
    pub async fn fuzzy_lookup(
        &self,
        category: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<FuzzyMatch>, RepositoryError> {
        let candidates = self
            .repository
            .candidates(category, self.config.min_success_rate, self.config.fuzzy_candidate_limit)
            .await?;

        if candidates.is_empty() {
            debug!(category, "No fuzzy candidates");
            return Ok(None);
        }

        let weights = self.config.weights();
        let scored = candidates
            .into_iter()
            .map(|entry| {
                let score = score_candidate(&entry, title, description, &weights);
                (entry, score)
            })
            .collect::<Vec<_>>();

        let Some((best, score)) = select_best(scored, self.config.similarity_threshold) else {
            debug!(category, threshold = self.config.similarity_threshold, "Fuzzy cache miss");
            return Ok(None);
        };

        // The entry may have dropped below the threshold since it was listed
        let counted = self
            .repository
            .record_hit(&best.fingerprint, self.config.min_success_rate, Utc::now())
            .await?;

        Ok(counted.map(|entry| {
            info!(
                fingerprint = %entry.fingerprint,
                score,
                usage_count = entry.usage_count,
                "Fuzzy cache hit"
            );
            FuzzyMatch { entry, score }
        }))
    }

    /// Upsert a freshly validated artifact. Learned counters survive a regeneration.
    pub async fn store(
        &self,
        identity: &IssueIdentity,
        fix_type: FixType,
        artifact: ArtifactBody,
        model_used: &str,
    ) -> Result<CacheEntry, RepositoryError> {
        let solution = NewSolution {
            fingerprint: IssueFingerprinter::for_identity(identity),
            category: identity.category.clone(),
            title: identity.title.clone(),
            description: identity.description.clone(),
            fix_type,
            artifact,
            model_used: model_used.to_string(),
        };

        let entry = self
            .repository
            .upsert(solution, self.config.initial_success_rate, Utc::now())
            .await?;

        info!(
            fingerprint = %entry.fingerprint,
            usage_count = entry.usage_count,
            success_rate = entry.success_rate,
            "Stored solution"
        );
        Ok(entry)
    }

    pub async fn get_stats(&self) -> Result<CacheStats, RepositoryError> {
        self.repository.stats().await
    }
}

pub fn score_candidate(
    entry: &CacheEntry,
    title: &str,
    description: &str,
    weights: &SimilarityWeights,
) -> f64 {
    combined_score(
        similarity(&entry.title, title),
        similarity(&entry.description, description),
        entry.success_rate,
        weights,
    )
}

/// Highest score at or above `threshold`. Ties keep the earlier candidate,
/// so the repository's usage ordering decides.
pub fn select_best<T>(scored: Vec<(T, f64)>, threshold: f64) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for (candidate, score) in scored {
        if score < threshold {
            continue;
        }
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}
