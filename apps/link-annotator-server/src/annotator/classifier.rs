//! External link classification

use std::path::Path;

use serde::Serialize;
use url::Url;

/// Extensions of media files that play inline and are never annotated
pub const EXCLUDED_MEDIA_EXTENSIONS: [&str; 3] = ["mp4", "webm", "ogg"];

/// Outcome of classifying a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub external: bool,
}

/// Decides whether a link target is external to a site
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    site_base_url: String,
}

impl LinkClassifier {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        Self {
            site_base_url: site_base_url.into(),
        }
    }

    pub fn classify(&self, url: &str) -> Classification {
        classify(url, &self.site_base_url)
    }
}

/// Classify `url` relative to `site_base_url`
///
/// A URL is external when it does not contain the site base, parses as an
/// absolute URL with a host, and does not point at an inline media file.
/// Anything malformed is not external.
pub fn classify(url: &str, site_base_url: &str) -> Classification {
    if !site_base_url.is_empty() && url.contains(site_base_url) {
        return Classification { external: false };
    }

    let Some(parsed) = parse_absolute(url) else {
        return Classification { external: false };
    };

    Classification {
        external: !is_media_path(parsed.path()),
    }
}

fn parse_absolute(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Some(parsed),
        _ => None,
    }
}

fn is_media_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            EXCLUDED_MEDIA_EXTENSIONS
                .iter()
                .any(|media| media.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://mysite.test";

    #[test]
    fn test_external_page() {
        assert!(classify("https://example.com/page", SITE).external);
    }

    #[test]
    fn test_same_site_absolute() {
        assert!(!classify("https://mysite.test/about", SITE).external);
    }

    #[test]
    fn test_site_base_anywhere_in_url() {
        // Substring match, as in redirect or share links
        assert!(!classify("https://share.example.com/?u=https://mysite.test/post", SITE).external);
    }

    #[test]
    fn test_relative_urls_not_external() {
        assert!(!classify("/local", SITE).external);
        assert!(!classify("page.html", SITE).external);
        assert!(!classify("#section", SITE).external);
        assert!(!classify("//example.com/page", SITE).external);
    }

    #[test]
    fn test_malformed_not_external() {
        assert!(!classify("https://", SITE).external);
        assert!(!classify("http://exa mple.com", SITE).external);
        assert!(!classify("", SITE).external);
    }

    #[test]
    fn test_hostless_schemes_not_external() {
        assert!(!classify("mailto:someone@example.com", SITE).external);
        assert!(!classify("tel:+15555550100", SITE).external);
        assert!(!classify("javascript:void(0)", SITE).external);
    }

    #[test]
    fn test_media_extension_excluded() {
        assert!(!classify("https://example.com/video.mp4", SITE).external);
        assert!(!classify("https://example.com/clip.webm", SITE).external);
        assert!(!classify("https://example.com/sound.ogg", SITE).external);
        assert!(!classify("https://example.com/VIDEO.MP4", SITE).external);
    }

    #[test]
    fn test_extension_flips_classification() {
        assert!(!classify("https://example.com/media/intro.mp4", SITE).external);
        assert!(classify("https://example.com/media/intro", SITE).external);
    }

    #[test]
    fn test_media_extension_in_query_ignored() {
        assert!(classify("https://example.com/watch?file=intro.mp4", SITE).external);
    }

    #[test]
    fn test_other_extensions_external() {
        assert!(classify("https://example.com/paper.pdf", SITE).external);
        assert!(classify("https://example.com/index.html", SITE).external);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = LinkClassifier::new(SITE);
        for url in [
            "https://example.com/page",
            "/local",
            "https://example.com/video.mp4",
            "https://mysite.test/x",
        ] {
            assert_eq!(classifier.classify(url), classifier.classify(url));
        }
    }

    #[test]
    fn test_empty_site_base_skips_substring_check() {
        assert!(classify("https://example.com/page", "").external);
    }
}
