//! Title cache maintenance endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::error::Result;
use crate::state::AppState;

/// Create the cache router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/purge", post(purge_expired))
        .route("/", delete(clear))
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: usize,
}

async fn stats(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    Ok(Json(state.title_cache().stats().await?))
}

/// Drop expired entries
async fn purge_expired(State(state): State<AppState>) -> Result<Json<PurgeResponse>> {
    let removed = state.title_cache().purge_expired().await?;
    tracing::info!(removed, "Purged expired title cache entries");

    Ok(Json(PurgeResponse { removed }))
}

/// Drop every entry
async fn clear(State(state): State<AppState>) -> Result<StatusCode> {
    state.title_cache().clear().await?;
    tracing::info!("Cleared title cache");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::annotator::MockFetcher;
    use crate::routes::router;
    use crate::routes::test_support::*;

    async fn warm_state() -> crate::state::AppState {
        let state = test_state(MockFetcher::new().with_title("https://example.com/", "Example")).await;
        send(
            router(state.clone()),
            json_request(
                "POST",
                "/api/v1/annotate",
                json!({ "content": r#"<a href="https://example.com/">Example</a>"# }),
            ),
        )
        .await;
        state
    }

    #[tokio::test]
    async fn test_stats_after_annotation() {
        let state = warm_state().await;

        let response = send(router(state), empty_request("GET", "/api/v1/cache/stats")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["entries"], 1);
        assert_eq!(body["live_entries"], 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_live_entries() {
        let state = warm_state().await;

        let response = send(router(state.clone()), empty_request("POST", "/api/v1/cache/purge")).await;

        assert_eq!(body_json(response).await["removed"], 0);
        assert_eq!(state.title_cache().stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let state = warm_state().await;

        let response = send(router(state.clone()), empty_request("DELETE", "/api/v1/cache")).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.title_cache().stats().await.unwrap().entries, 0);
    }
}
