//! References block rendering

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{ExternalLink, REFERENCES_ID};

/// Renders the numbered references list appended to annotated content
#[derive(Debug, Clone)]
pub struct ReferenceRenderer {
    heading: String,
}

impl ReferenceRenderer {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }

    /// Render `links` as a references block
    ///
    /// Each entry gets the id `ref-<number>` so markers can target it.
    /// Returns an empty string for an empty list.
    pub fn render(&self, links: &[ExternalLink]) -> String {
        if links.is_empty() {
            return String::new();
        }

        let mut html = format!(
            r#"<div id="{}"><h3>{}</h3><ol>"#,
            REFERENCES_ID,
            encode_text(&self.heading)
        );

        for link in links {
            html.push_str(&format!(
                r#"<li id="ref-{}"><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                link.number,
                encode_double_quoted_attribute(&link.url),
                encode_text(&link.title)
            ));
        }

        html.push_str("</ol></div>");
        html
    }
}
