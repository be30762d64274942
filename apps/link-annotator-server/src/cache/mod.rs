//! Title cache
//!
//! Expiring key-value storage for resolved page titles. Keys are derived from
//! the URL with SHA-256 so arbitrary URLs map to fixed-size, opaque keys.
//!
//! # Backends
//!
//! - [`MemoryTitleCache`]: process-local map, lost on restart
//! - [`SqliteTitleCache`]: persisted in the application database
//!
//! Both backends treat writes as upserts, so concurrent renders resolving the
//! same URL simply overwrite each other with the same title.

mod memory;
mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use memory::MemoryTitleCache;
pub use sqlite::SqliteTitleCache;

/// How long a resolved title stays valid
pub const TITLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Prefix shared by every title cache key
const KEY_PREFIX: &str = "title_";

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single cached title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleCacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl TitleCacheEntry {
    /// Whether the entry is still valid at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Stored entries, including expired ones not yet purged
    pub entries: usize,
    /// Entries that would still be served
    pub live_entries: usize,
}

/// Which backend holds the title cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    Sqlite,
}

/// Expiring key-value store for page titles
#[async_trait]
pub trait TitleCache: Send + Sync {
    /// Get a live value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Insert or overwrite a value valid for `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, CacheError>;

    /// Drop every entry
    async fn clear(&self) -> Result<(), CacheError>;

    /// Entry counts
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Derive the cache key for a URL
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(digest))
}

/// Compute the absolute expiry for a TTL starting at `now`
fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CacheError> {
    let ttl = chrono::Duration::from_std(ttl).map_err(|e| CacheError::InvalidTtl(e.to_string()))?;
    now.checked_add_signed(ttl)
        .ok_or_else(|| CacheError::InvalidTtl("expiry out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_stable() {
        let a = cache_key("https://example.com/page");
        let b = cache_key("https://example.com/page");

        assert_eq!(a, b);
        assert!(a.starts_with("title_"));
        // prefix + 64 hex chars
        assert_eq!(a.len(), KEY_PREFIX.len() + 64);
    }

    #[test]
    fn test_cache_key_differs_per_url() {
        assert_ne!(
            cache_key("https://example.com/page"),
            cache_key("https://example.com/page2")
        );
    }

    #[test]
    fn test_entry_liveness() {
        let now = Utc::now();
        let entry = TitleCacheEntry {
            key: cache_key("https://example.com"),
            value: "Example".to_string(),
            expires_at: now + chrono::Duration::seconds(10),
        };

        assert!(entry.is_live(now));
        assert!(!entry.is_live(now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn test_expiry_rejects_huge_ttl() {
        let result = expiry_from(Utc::now(), Duration::from_secs(u64::MAX));
        assert!(result.is_err());
    }
}
