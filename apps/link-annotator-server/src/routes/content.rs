//! Per-content settings and rendering endpoints

use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::ContentSettingsRepository;
use crate::error::Result;
use crate::state::AppState;

/// Create the content router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enabled", get(list_enabled))
        .route("/:id/settings", get(get_settings).put(update_settings))
        .route("/:id/render", post(render_content))
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub content_id: String,
    pub enabled: bool,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnabledContentResponse {
    pub content_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub content: String,
}

/// List content items with annotation enabled
async fn list_enabled(State(state): State<AppState>) -> Result<Json<EnabledContentResponse>> {
    let content_ids = ContentSettingsRepository::new(state.db())
        .list_enabled()
        .await?;

    Ok(Json(EnabledContentResponse { content_ids }))
}

/// Get annotation settings for a content item
///
/// Items that were never enabled report `enabled: false`.
async fn get_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SettingsResponse>> {
    let repo = ContentSettingsRepository::new(state.db());
    let settings = repo.get(&id).await?;

    Ok(Json(match settings {
        Some(s) => SettingsResponse {
            content_id: s.content_id,
            enabled: s.enabled,
            updated_at: Some(s.updated_at),
        },
        None => SettingsResponse {
            content_id: id,
            enabled: false,
            updated_at: None,
        },
    }))
}

/// Update annotation settings for a content item
async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>> {
    let repo = ContentSettingsRepository::new(state.db());
    repo.set_enabled(&id, request.enabled).await?;

    let updated_at = repo.get(&id).await?.map(|s| s.updated_at);

    Ok(Json(SettingsResponse {
        content_id: id,
        enabled: request.enabled,
        updated_at,
    }))
}

/// Render content using the item's stored flag
async fn render_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenderRequest>,
) -> Result<Html<String>> {
    let enabled = ContentSettingsRepository::new(state.db())
        .is_enabled(&id)
        .await?;

    let html = state.annotator().annotate(&request.content, enabled).await;
    tracing::debug!(content_id = %id, enabled, "Rendered content");

    Ok(Html(html))
}
