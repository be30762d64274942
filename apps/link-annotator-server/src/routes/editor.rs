//! Editor control endpoints
//!
//! Serves the enable checkbox for the configured placement and accepts the
//! editor's save submission.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Router,
};
use serde::Deserialize;

use crate::db::ContentSettingsRepository;
use crate::editor::is_supported_content_type;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the editor router
pub fn router() -> Router<AppState> {
    Router::new().route("/:content_type/:id", get(render_control).post(save_control))
}

/// Editor form submission
///
/// Browsers omit unchecked checkboxes, so an absent field means disabled.
#[derive(Debug, Deserialize)]
pub struct EditorForm {
    pub ela_enable_feature: Option<String>,
}

impl EditorForm {
    fn enabled(&self) -> bool {
        self.ela_enable_feature
            .as_deref()
            .is_some_and(|v| !v.is_empty() && v != "0")
    }
}

/// Render the enable control for a content item
async fn render_control(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Html<String>> {
    let enabled = ContentSettingsRepository::new(state.db())
        .is_enabled(&id)
        .await?;

    state
        .editor_control()
        .render(&content_type, enabled)
        .map(Html)
        .ok_or_else(|| AppError::NotFound(format!("Content type {} has no editor control", content_type)))
}

/// Persist the checkbox state on save
async fn save_control(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
    Form(form): Form<EditorForm>,
) -> Result<StatusCode> {
    if !is_supported_content_type(&content_type) {
        return Err(AppError::NotFound(format!(
            "Content type {} has no editor control",
            content_type
        )));
    }

    ContentSettingsRepository::new(state.db())
        .set_enabled(&id, form.enabled())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
