//! Per-content annotation settings

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Annotation settings for one piece of content
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentSettings {
    pub content_id: String,
    pub enabled: bool,
    pub updated_at: String,
}

/// Content settings repository
pub struct ContentSettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ContentSettingsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get stored settings for a content item
    pub async fn get(&self, content_id: &str) -> Result<Option<ContentSettings>> {
        let settings = sqlx::query_as::<_, ContentSettings>(
            r#"
            SELECT content_id, enabled, updated_at
            FROM content_settings
            WHERE content_id = ?
            "#,
        )
        .bind(content_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(settings)
    }

    /// Whether annotation is enabled for a content item
    ///
    /// Content without stored settings is not annotated.
    pub async fn is_enabled(&self, content_id: &str) -> Result<bool> {
        Ok(self
            .get(content_id)
            .await?
            .map(|s| s.enabled)
            .unwrap_or(false))
    }

    /// Enable or disable annotation for a content item
    ///
    /// Disabling removes the row entirely.
    pub async fn set_enabled(&self, content_id: &str, enabled: bool) -> Result<()> {
        if enabled {
            sqlx::query(
                r#"
                INSERT INTO content_settings (content_id, enabled, updated_at)
                VALUES (?, 1, datetime('now'))
                ON CONFLICT(content_id) DO UPDATE SET
                    enabled = 1,
                    updated_at = datetime('now')
                "#,
            )
            .bind(content_id)
            .execute(self.pool)
            .await?;
        } else {
            sqlx::query("DELETE FROM content_settings WHERE content_id = ?")
                .bind(content_id)
                .execute(self.pool)
                .await?;
        }

        tracing::info!(content_id = %content_id, enabled, "Updated content annotation setting");
        Ok(())
    }

    /// List content ids with annotation enabled
    pub async fn list_enabled(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT content_id FROM content_settings
            WHERE enabled = 1
            ORDER BY content_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}
