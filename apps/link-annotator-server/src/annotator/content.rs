//! Content annotation
//!
//! Anchors are found with a tag-level pattern rather than a full parse.
//! Anchors whose markup does not fit the pattern (inner content spanning
//! lines, `>` inside attribute values) are left untouched.

use std::ops::Range;
use std::sync::OnceLock;
use std::time::Duration;

use html_escape::encode_double_quoted_attribute;
use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};
use regex::Regex;
use serde::Serialize;
use tokio::time::Instant;

use super::{
    ExternalLink, LinkClassifier, LinkCollector, ReferenceRenderer, TitleResolver, LINK_CLASS,
    MARKER_CLASS,
};

/// `<a … href="…" …>inner</a>`, case-insensitive, single line
static ANCHOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn anchor_regex() -> &'static Regex {
    ANCHOR_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)<a((?:\s[^>]*?)?\s)href=["']([^"']*)["']([^>]*)>(.*?)</a>"#)
            .expect("anchor pattern is valid")
    })
}

/// An anchor element matched in the source HTML
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnchorTag<'a> {
    span: Range<usize>,
    raw: &'a str,
    leading_attrs: &'a str,
    href: &'a str,
    trailing_attrs: &'a str,
    inner: &'a str,
}

fn scan_anchors(html: &str) -> Vec<AnchorTag<'_>> {
    anchor_regex()
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(AnchorTag {
                span: whole.range(),
                raw: whole.as_str(),
                leading_attrs: caps.get(1).map_or("", |m| m.as_str()),
                href: caps.get(2)?.as_str(),
                trailing_attrs: caps.get(3).map_or("", |m| m.as_str()),
                inner: caps.get(4).map_or("", |m| m.as_str()),
            })
        })
        .collect()
}

/// Plain text of an HTML fragment: tags and comments removed, entities decoded
fn strip_markup(fragment: &str) -> String {
    let stripped = rewrite_str(
        fragment,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                el.remove_and_keep_content();
                Ok(())
            })],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    let text = match stripped {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to strip anchor markup, using raw text");
            fragment.to_string()
        }
    };

    html_escape::decode_html_entities(&text).trim().to_string()
}

/// Disabled link text followed by its numbered marker
fn annotated_markup(number: usize, title: &str, inner: &str) -> String {
    format!(
        concat!(
            r#"<span class="{link_class}" data-number="{number}" data-tooltip-content="{title}">{inner}</span>"#,
            r#"<sup class="{marker_class}" data-number="{number}">{number}</sup>"#
        ),
        link_class = LINK_CLASS,
        marker_class = MARKER_CLASS,
        number = number,
        title = encode_double_quoted_attribute(title),
        inner = inner,
    )
}

/// Result of one annotation pass
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationOutput {
    pub html: String,
    pub links: Vec<ExternalLink>,
}

/// Annotates external links in rendered HTML
#[derive(Clone)]
pub struct ContentAnnotator {
    classifier: LinkClassifier,
    resolver: TitleResolver,
    renderer: ReferenceRenderer,
    render_budget: Option<Duration>,
}

impl ContentAnnotator {
    pub fn new(
        site_base_url: impl Into<String>,
        resolver: TitleResolver,
        references_heading: impl Into<String>,
    ) -> Self {
        Self {
            classifier: LinkClassifier::new(site_base_url),
            resolver,
            renderer: ReferenceRenderer::new(references_heading),
            render_budget: None,
        }
    }

    /// Bound the total time one pass spends resolving titles
    ///
    /// Links reached after the budget is spent are still annotated, with
    /// their own text as the title.
    pub fn with_render_budget(mut self, budget: Option<Duration>) -> Self {
        self.render_budget = budget;
        self
    }

    pub fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &TitleResolver {
        &self.resolver
    }

    /// Annotate `html`, returning the rewritten content
    pub async fn annotate(&self, html: &str, enabled: bool) -> String {
        self.annotate_with_links(html, enabled).await.html
    }

    /// Annotate `html`, returning the rewritten content and the links found
    pub async fn annotate_with_links(&self, html: &str, enabled: bool) -> AnnotationOutput {
        if !enabled {
            return AnnotationOutput {
                html: html.to_string(),
                links: Vec::new(),
            };
        }

        let anchors = scan_anchors(html);
        let deadline = self.render_budget.map(|budget| Instant::now() + budget);
        let mut collector = LinkCollector::new();
        let mut output = String::with_capacity(html.len());
        let mut cursor = 0;

        for anchor in &anchors {
            output.push_str(&html[cursor..anchor.span.start]);
            cursor = anchor.span.end;

            let url = html_escape::decode_html_entities(anchor.href).trim().to_string();
            if !self.classifier.classify(&url).external {
                output.push_str(anchor.raw);
                continue;
            }

            let mut fallback = strip_markup(anchor.inner);
            if fallback.is_empty() {
                // Image-only anchors have no text
                fallback = url.clone();
            }

            let title = self.resolve_within(&url, &fallback, deadline).await;
            let number = collector.push(url.as_str(), title.as_str());

            tracing::debug!(
                number,
                url = %url,
                leading_attrs = %anchor.leading_attrs.trim(),
                trailing_attrs = %anchor.trailing_attrs.trim(),
                "Annotated external link"
            );

            output.push_str(&annotated_markup(number, &title, anchor.inner));
        }

        output.push_str(&html[cursor..]);

        if !collector.is_empty() {
            output.push_str(&self.renderer.render(collector.links()));
            tracing::debug!(
                anchors = anchors.len(),
                annotated = collector.len(),
                "Annotation pass complete"
            );
        }

        AnnotationOutput {
            html: output,
            links: collector.into_links(),
        }
    }

    async fn resolve_within(&self, url: &str, fallback: &str, deadline: Option<Instant>) -> String {
        let Some(deadline) = deadline else {
            return self.resolver.resolve_title(url, fallback).await;
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::debug!(url = %url, "Render budget spent, using fallback title");
            return fallback.to_string();
        }

        match tokio::time::timeout(remaining, self.resolver.resolve_title(url, fallback)).await {
            Ok(title) => title,
            Err(_) => {
                tracing::warn!(url = %url, "Title resolution exceeded render budget");
                fallback.to_string()
            }
        }
    }
}
