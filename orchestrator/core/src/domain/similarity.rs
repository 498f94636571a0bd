// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! String similarity used by fuzzy cache lookup.
//!
//! Similarity is the Levenshtein ratio `1 - distance / max_len` over Unicode
//! scalar values, computed on text normalized the same way for both sides
//! (lowercase, trimmed, inner whitespace collapsed).

/// Weights for the combined fuzzy-match score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub title: f64,
    pub description: f64,
    pub success_bonus: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.7,
            description: 0.3,
            success_bonus: 0.05,
        }
    }
}

pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized similarity in `[0.0, 1.0]`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_text(a).chars().collect();
    let b: Vec<char> = normalize_text(b).chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// `weights.title * title_sim + weights.description * description_sim
/// + success_rate * weights.success_bonus`, capped at 1.0.
pub fn combined_score(
    title_similarity: f64,
    description_similarity: f64,
    success_rate: f64,
    weights: &SimilarityWeights,
) -> f64 {
    let base = weights.title * title_similarity + weights.description * description_similarity;
    (base + success_rate * weights.success_bonus).min(1.0)
}

/// Two-row Levenshtein distance.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
