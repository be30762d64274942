//! SQLite-backed title cache
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so expiry
//! comparisons can run in SQL with plain string ordering.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use super::{expiry_from, CacheError, CacheStats, TitleCache};

/// Title cache persisted in the `title_cache` table
#[derive(Clone)]
pub struct SqliteTitleCache {
    pool: SqlitePool,
}

impl SqliteTitleCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl TitleCache for SqliteTitleCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM title_cache
            WHERE key = ? AND expires_at > ?
            "#,
        )
        .bind(key)
        .bind(timestamp(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = expiry_from(Utc::now(), ttl)?;

        sqlx::query(
            r#"
            INSERT INTO title_cache (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(timestamp(expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let result = sqlx::query("DELETE FROM title_cache WHERE expires_at <= ?")
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() as usize;
        tracing::debug!(removed, "Purged expired title cache rows");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM title_cache")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (entries, live_entries) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0)
            FROM title_cache
            "#,
        )
        .bind(timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            entries: entries as usize,
            live_entries: live_entries as usize,
        })
    }
}
