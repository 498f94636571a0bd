// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Solution Repository
//!
//! Production `SolutionRepository` backed by the `solution_cache` table via
//! `sqlx`. Every mutation is a single statement, so Postgres row locking
//! provides the per-fingerprint atomicity the pipeline relies on:
//!
//! - hits: `FOR UPDATE` CTE, returning the row as it was served
//! - store: `INSERT ... ON CONFLICT DO UPDATE` touching content columns only,
//!   the SQL form of `CacheEntry::merge_regenerated`
//! - feedback: clamped `UPDATE` returning the old and new rate

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::collections::BTreeMap;

use crate::domain::artifact::{ArtifactBody, FixType};
use crate::domain::cache::{CacheEntry, CacheStats, CategoryStats, NewSolution};
use crate::domain::fingerprint::Fingerprint;
use crate::domain::repository::{RepositoryError, SolutionRepository, SuccessRateChange};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS solution_cache (
        fingerprint TEXT PRIMARY KEY,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        fix_type TEXT NOT NULL,
        content TEXT NOT NULL,
        integration_instructions TEXT NOT NULL DEFAULT '',
        model_used TEXT NOT NULL,
        usage_count BIGINT NOT NULL DEFAULT 1 CHECK (usage_count >= 1),
        success_rate DOUBLE PRECISION NOT NULL CHECK (success_rate >= 0 AND success_rate <= 1),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        last_used_at TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_CATEGORY_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_solution_cache_category
        ON solution_cache (category, usage_count DESC, success_rate DESC)
"#;

const ENTRY_COLUMNS: &str = "fingerprint, category, title, description, fix_type, content, \
     integration_instructions, model_used, usage_count, success_rate, created_at, updated_at, last_used_at";

pub struct PostgresSolutionRepository {
    pool: PgPool,
}

impl PostgresSolutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and index if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to create solution_cache: {}", e)))?;
        sqlx::query(CREATE_CATEGORY_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to create index: {}", e)))?;
        Ok(())
    }
}

fn row_to_entry(row: &PgRow) -> Result<CacheEntry, RepositoryError> {
    let fix_type_str: String = row.try_get("fix_type")?;
    let fix_type: FixType = serde_json::from_value(serde_json::Value::String(fix_type_str.clone()))
        .map_err(|_| RepositoryError::Serialization(format!("Unknown fix_type '{}'", fix_type_str)))?;
    let usage_count: i64 = row.try_get("usage_count")?;

    Ok(CacheEntry {
        fingerprint: Fingerprint::from_stored(row.try_get::<String, _>("fingerprint")?),
        category: row.try_get("category")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        fix_type,
        artifact: ArtifactBody::new(
            row.try_get::<String, _>("content")?,
            row.try_get::<String, _>("integration_instructions")?,
        ),
        model_used: row.try_get("model_used")?,
        usage_count: u64::try_from(usage_count).unwrap_or(1),
        success_rate: row.try_get("success_rate")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_used_at: row.try_get("last_used_at")?,
    })
}

#[async_trait]
impl SolutionRepository for PostgresSolutionRepository {
    async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM solution_cache WHERE fingerprint = $1",
            ENTRY_COLUMNS
        ))
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn record_hit(
        &self,
        fingerprint: &Fingerprint,
        min_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            WITH previous AS (
                SELECT {}
                FROM solution_cache
                WHERE fingerprint = $1 AND success_rate >= $2
                FOR UPDATE
            )
            UPDATE solution_cache AS s
            SET usage_count = previous.usage_count + 1, last_used_at = $3
            FROM previous
            WHERE s.fingerprint = previous.fingerprint
            RETURNING previous.*
            "#,
            ENTRY_COLUMNS
        ))
        .bind(fingerprint.as_str())
        .bind(min_success_rate)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn candidates(
        &self,
        category: &str,
        min_success_rate: f64,
        limit: usize,
    ) -> Result<Vec<CacheEntry>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM solution_cache
            WHERE category = $1 AND success_rate >= $2
            ORDER BY usage_count DESC, success_rate DESC
            LIMIT $3
            "#,
            ENTRY_COLUMNS
        ))
        .bind(category)
        .bind(min_success_rate)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn upsert(
        &self,
        solution: NewSolution,
        initial_success_rate: f64,
        at: DateTime<Utc>,
    ) -> Result<CacheEntry, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO solution_cache (
                fingerprint, category, title, description, fix_type, content,
                integration_instructions, model_used, usage_count, success_rate,
                created_at, updated_at, last_used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $10, $10, $10)
            ON CONFLICT (fingerprint) DO UPDATE SET
                category = EXCLUDED.category,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                fix_type = EXCLUDED.fix_type,
                content = EXCLUDED.content,
                integration_instructions = EXCLUDED.integration_instructions,
                model_used = EXCLUDED.model_used,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(solution.fingerprint.as_str())
        .bind(&solution.category)
        .bind(&solution.title)
        .bind(&solution.description)
        .bind(solution.fix_type.as_str())
        .bind(&solution.artifact.content)
        .bind(&solution.artifact.integration_instructions)
        .bind(&solution.model_used)
        .bind(initial_success_rate.clamp(0.0, 1.0))
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to store solution: {}", e)))?;

        row_to_entry(&row)
    }

    async fn adjust_success_rate(
        &self,
        fingerprint: &Fingerprint,
        delta: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<SuccessRateChange>, RepositoryError> {
        let row = sqlx::query(
            r#"
            WITH previous AS (
                SELECT fingerprint, success_rate
                FROM solution_cache
                WHERE fingerprint = $1
                FOR UPDATE
            )
            UPDATE solution_cache AS s
            SET success_rate = LEAST(GREATEST(previous.success_rate + $2, 0.0), 1.0),
                updated_at = $3
            FROM previous
            WHERE s.fingerprint = previous.fingerprint
            RETURNING previous.success_rate AS previous_rate, s.success_rate AS current_rate
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(delta)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<SuccessRateChange, RepositoryError> {
            Ok(SuccessRateChange {
                previous: row.try_get("previous_rate")?,
                current: row.try_get("current_rate")?,
            })
        })
        .transpose()
    }

    async fn stats(&self) -> Result<CacheStats, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT category,
                   COUNT(*)::BIGINT AS entries,
                   SUM(usage_count)::BIGINT AS usage,
                   SUM(usage_count - 1)::BIGINT AS hits,
                   SUM(success_rate)::DOUBLE PRECISION AS rate_sum
            FROM solution_cache
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = CacheStats::default();
        let mut rate_sum = 0.0;
        let mut categories = BTreeMap::new();

        for row in rows {
            let category: String = row.try_get("category")?;
            let entries = row.try_get::<i64, _>("entries")?.max(0) as u64;
            let usage = row.try_get::<i64, _>("usage")?.max(0) as u64;
            let hits = row.try_get::<i64, _>("hits")?.max(0) as u64;
            let category_rate_sum: f64 = row.try_get("rate_sum")?;

            stats.total_entries += entries;
            stats.total_usage += usage;
            stats.total_hits += hits;
            rate_sum += category_rate_sum;

            categories.insert(
                category,
                CategoryStats {
                    entries,
                    hits,
                    average_success_rate: if entries > 0 {
                        category_rate_sum / entries as f64
                    } else {
                        0.0
                    },
                },
            );
        }

        if stats.total_entries > 0 {
            stats.average_success_rate = rate_sum / stats.total_entries as f64;
        }
        stats.categories = categories;
        Ok(stats)
    }
}
