//! Editor enable control
//!
//! The authoring UI shows a checkbox that opts a content item into link
//! annotation. Where it appears is a global choice read once at startup:
//! a meta box in the editor sidebar, or a checkbox at the bottom of the
//! editor's publish box. [`control_for`] picks the matching renderer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Content types that can be annotated
const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["post", "page", "product"];

/// Form field carrying the checkbox state
pub const ENABLE_FIELD: &str = "ela_enable_feature";

const CONTROL_LABEL: &str = "Enable External Link Annotator";

/// Where the enable control is placed in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLocation {
    #[default]
    Sidebar,
    Bottom,
}

impl FromStr for DisplayLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sidebar" => Ok(Self::Sidebar),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unknown display location: {}", other)),
        }
    }
}

impl fmt::Display for DisplayLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sidebar => f.write_str("sidebar"),
            Self::Bottom => f.write_str("bottom"),
        }
    }
}

/// Whether a content type gets the enable control
pub fn is_supported_content_type(content_type: &str) -> bool {
    SUPPORTED_CONTENT_TYPES.contains(&content_type)
}

/// Renders the enable checkbox for one editor placement
pub trait EditorControl: Send + Sync {
    /// Placement this control renders for
    fn location(&self) -> DisplayLocation;

    /// Render the control HTML, or `None` for unsupported content types
    fn render(&self, content_type: &str, enabled: bool) -> Option<String>;
}

/// Meta box in the editor sidebar
pub struct SidebarMetaBox;

impl EditorControl for SidebarMetaBox {
    fn location(&self) -> DisplayLocation {
        DisplayLocation::Sidebar
    }

    fn render(&self, content_type: &str, enabled: bool) -> Option<String> {
        if !is_supported_content_type(content_type) {
            return None;
        }

        Some(format!(
            concat!(
                r#"<div id="ela_enable_feature_box" class="postbox ela-meta-box" data-context="side">"#,
                r#"<h2 class="hndle">{label}</h2>"#,
                r#"<div class="inside">{checkbox}</div>"#,
                "</div>"
            ),
            label = CONTROL_LABEL,
            checkbox = checkbox(enabled, "Annotate external links"),
        ))
    }
}

/// Checkbox at the bottom of the publish box
pub struct SubmitBoxCheckbox;

impl EditorControl for SubmitBoxCheckbox {
    fn location(&self) -> DisplayLocation {
        DisplayLocation::Bottom
    }

    fn render(&self, content_type: &str, enabled: bool) -> Option<String> {
        if !is_supported_content_type(content_type) {
            return None;
        }

        Some(format!(
            r#"<div class="misc-pub-section ela-checkbox">{}</div>"#,
            checkbox(enabled, CONTROL_LABEL)
        ))
    }
}

fn checkbox(enabled: bool, label: &str) -> String {
    format!(
        r#"<label for="{field}"><input type="checkbox" id="{field}" name="{field}" value="1"{checked} /> {label}</label>"#,
        field = ENABLE_FIELD,
        checked = if enabled { r#" checked="checked""# } else { "" },
        label = label,
    )
}

/// Select the editor control for a configured placement
pub fn control_for(location: DisplayLocation) -> Arc<dyn EditorControl> {
    match location {
        DisplayLocation::Sidebar => Arc::new(SidebarMetaBox),
        DisplayLocation::Bottom => Arc::new(SubmitBoxCheckbox),
    }
}
