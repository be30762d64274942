//! In-memory title cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{expiry_from, CacheError, CacheStats, TitleCache, TitleCacheEntry};

/// Thread-safe in-memory title cache
///
/// Expired entries are filtered on read and only removed by
/// [`TitleCache::purge_expired`].
#[derive(Clone, Default)]
pub struct MemoryTitleCache {
    entries: Arc<RwLock<HashMap<String, TitleCacheEntry>>>,
}

impl MemoryTitleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw entry for a key, live or not
    #[cfg(test)]
    pub(crate) fn entry(&self, key: &str) -> Option<TitleCacheEntry> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl TitleCache for MemoryTitleCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = expiry_from(Utc::now(), ttl)?;
        let entry = TitleCacheEntry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at,
        };

        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();

        tracing::debug!(removed, "Purged expired title cache entries");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Utc::now();
        let entries = self.entries.read();
        Ok(CacheStats {
            entries: entries.len(),
            live_entries: entries.values().filter(|e| e.is_live(now)).count(),
        })
    }
}
