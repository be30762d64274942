//! Title resolution with caching
//!
//! Resolving a title never fails: every error path returns the caller's
//! fallback text. Only successfully extracted titles are cached, so a
//! blocked or unreachable page is retried on the next render.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;

use super::fetcher::TitleFetcher;
use crate::cache::{cache_key, TitleCache, TITLE_TTL};

/// First `<title>` element, across lines, any case
static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Status code treated as a deliberate block
const STATUS_FORBIDDEN: u16 = 403;

fn title_regex() -> &'static Regex {
    TITLE_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<title(?:\s[^>]*)?>(.*?)</title>").expect("title pattern is valid")
    })
}

/// Extract the document title from an HTML body
///
/// Entities are decoded and whitespace runs collapsed. Returns `None` when
/// there is no title or it is blank.
pub fn extract_title(body: &str) -> Option<String> {
    let raw = title_regex().captures(body)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw);
    let title = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Resolves display titles for URLs
#[derive(Clone)]
pub struct TitleResolver {
    cache: Arc<dyn TitleCache>,
    fetcher: Arc<dyn TitleFetcher>,
    ttl: Duration,
}

impl TitleResolver {
    pub fn new(cache: Arc<dyn TitleCache>, fetcher: Arc<dyn TitleFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            ttl: TITLE_TTL,
        }
    }

    pub fn cache(&self) -> &Arc<dyn TitleCache> {
        &self.cache
    }

    /// Resolve the title of `url`, or return `fallback`
    pub async fn resolve_title(&self, url: &str, fallback: &str) -> String {
        let key = cache_key(url);

        match self.cache.get(&key).await {
            Ok(Some(title)) => {
                tracing::debug!(url = %url, "Title cache hit");
                return title;
            }
            Ok(None) => {}
            Err(e) => {
                // Unavailable cache behaves like a miss
                tracing::warn!(url = %url, error = %e, "Title cache read failed");
            }
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Title fetch failed, using fallback");
                return fallback.to_string();
            }
        };

        if page.status == STATUS_FORBIDDEN {
            tracing::debug!(url = %url, "Title fetch forbidden, using fallback");
            return fallback.to_string();
        }

        let Some(title) = extract_title(&page.body) else {
            tracing::debug!(url = %url, status = page.status, "No title in response, using fallback");
            return fallback.to_string();
        };

        if let Err(e) = self.cache.set(&key, &title, self.ttl).await {
            tracing::warn!(url = %url, error = %e, "Title cache write failed");
        }

        title
    }
}
