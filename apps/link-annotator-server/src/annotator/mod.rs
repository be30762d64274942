//! Link annotation pipeline
//!
//! Rewrites rendered article HTML so every external link becomes a
//! de-linked span followed by a numbered marker, and appends a references
//! list pointing at the original URLs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use link_annotator_server::annotator::{ContentAnnotator, HttpTitleFetcher, TitleResolver};
//! use link_annotator_server::cache::MemoryTitleCache;
//!
//! let fetcher = HttpTitleFetcher::new(&config.fetch)?;
//! let resolver = TitleResolver::new(Arc::new(MemoryTitleCache::new()), Arc::new(fetcher));
//! let annotator = ContentAnnotator::new("https://mysite.test", resolver, "References");
//!
//! let html = annotator.annotate(&content, true).await;
//! ```
//!
//! ## Markup contract
//!
//! The client script and stylesheet rely on these names:
//!
//! - `.ela-link[data-number][data-tooltip-content]`: the de-linked anchor text
//! - `sup.ela-marker[data-number]`: the marker
//! - `#ela-references li#ref-<n>`: the reference entry

mod classifier;
mod content;
mod fetcher;
mod references;
mod resolver;

use serde::Serialize;

pub use classifier::{classify, Classification, LinkClassifier, EXCLUDED_MEDIA_EXTENSIONS};
pub use content::{AnnotationOutput, ContentAnnotator};
pub use fetcher::{FetchError, FetchedPage, HttpTitleFetcher, TitleFetcher};
pub use references::ReferenceRenderer;
pub use resolver::{extract_title, TitleResolver};

#[cfg(test)]
pub(crate) use fetcher::MockFetcher;

/// Class of the span replacing an annotated anchor
pub const LINK_CLASS: &str = "ela-link";

/// Class of the superscript marker
pub const MARKER_CLASS: &str = "ela-marker";

/// Id of the references container
pub const REFERENCES_ID: &str = "ela-references";

/// An annotated link, numbered in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLink {
    pub number: usize,
    pub url: String,
    pub title: String,
}

/// Accumulates the links found during one annotation pass
#[derive(Debug, Default)]
pub struct LinkCollector {
    links: Vec<ExternalLink>,
}

impl LinkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link and return its number (1-based)
    pub fn push(&mut self, url: impl Into<String>, title: impl Into<String>) -> usize {
        let number = self.links.len() + 1;
        self.links.push(ExternalLink {
            number,
            url: url.into(),
            title: title.into(),
        });
        number
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[ExternalLink] {
        &self.links
    }

    pub fn into_links(self) -> Vec<ExternalLink> {
        self.links
    }
}
