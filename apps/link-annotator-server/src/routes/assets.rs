//! Client assets for annotated pages

use axum::{http::header, response::IntoResponse, routing::get, Router};

use crate::state::AppState;

const SCRIPT: &str = include_str!("../../assets/annotator.js");
const STYLESHEET: &str = include_str!("../../assets/annotator.css");

/// Create the assets router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/annotator.js", get(script))
        .route("/annotator.css", get(stylesheet))
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT,
    )
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
