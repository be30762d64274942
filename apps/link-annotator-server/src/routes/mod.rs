//! Route modules for Link Annotator Server

pub mod annotate;
pub mod assets;
pub mod cache;
pub mod content;
pub mod editor;
pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1/annotate", annotate::router())
        .nest("/api/v1/content", content::router())
        .nest("/api/v1/editor", editor::router())
        .nest("/api/v1/cache", cache::router())
        .nest("/assets", assets::router())
        .with_state(state)
}
