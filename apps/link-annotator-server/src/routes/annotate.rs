//! Annotation API endpoints
//!
//! Stateless entry points into the annotation pipeline: annotate a piece of
//! content, classify a single URL, or resolve a single title.
//!
//! Title lookups only reach public hosts. Loopback, private and link-local
//! address literals and `localhost` names are rejected before any request is
//! made. Names that resolve to such addresses are not checked, so the server
//! should not be exposed where that matters.

use std::net::{Ipv4Addr, Ipv6Addr};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::annotator::AnnotationOutput;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the annotate router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(annotate))
        .route("/classify", post(classify))
        .route("/title", get(resolve_title))
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub content: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub url: String,
    pub external: bool,
}

#[derive(Debug, Deserialize)]
pub struct TitleParams {
    pub url: String,
    pub fallback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub url: String,
    pub title: String,
}

/// Annotate a piece of content
async fn annotate(
    State(state): State<AppState>,
    Json(request): Json<AnnotateRequest>,
) -> Json<AnnotationOutput> {
    let output = state
        .annotator()
        .annotate_with_links(&request.content, request.enabled)
        .await;

    tracing::info!(
        enabled = request.enabled,
        links = output.links.len(),
        "Annotated content"
    );

    Json(output)
}

/// Classify a single URL against the configured site
async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let classification = state.annotator().classifier().classify(&request.url);

    Json(ClassifyResponse {
        url: request.url,
        external: classification.external,
    })
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_public_ipv4(mapped);
    }

    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link-local
    !(ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80)
}

/// Whether `url` names a host outside the local network
fn is_public_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain != "localhost" && !domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_public_ipv4(ip),
        Some(Host::Ipv6(ip)) => is_public_ipv6(ip),
        None => false,
    }
}

/// Resolve the title of a single URL
async fn resolve_title(
    State(state): State<AppState>,
    Query(params): Query<TitleParams>,
) -> Result<Json<TitleResponse>> {
    let parsed = Url::parse(&params.url)
        .map_err(|e| AppError::BadRequest(format!("Invalid URL {}: {}", params.url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::BadRequest(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }
    if !is_public_host(&parsed) {
        tracing::warn!(url = %params.url, "Rejected title lookup for a local host");
        return Err(AppError::BadRequest(format!(
            "Title lookups are limited to public hosts: {}",
            params.url
        )));
    }

    let fallback = params.fallback.unwrap_or_else(|| params.url.clone());
    let title = state
        .annotator()
        .resolver()
        .resolve_title(&params.url, &fallback)
        .await;

    Ok(Json(TitleResponse {
        url: params.url,
        title,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::is_public_host;
    use crate::annotator::MockFetcher;
    use crate::routes::router;
    use crate::routes::test_support::*;

    fn public(raw: &str) -> bool {
        is_public_host(&url::Url::parse(raw).unwrap())
    }

    #[tokio::test]
    async fn test_annotate_content() {
        let fetcher = MockFetcher::new().with_title("https://example.com/page", "Example Page");
        let app = router(test_state(fetcher).await);
        let content = r#"<p>See <a href="https://example.com/page">Example</a> and <a href="/local">Local</a></p>"#;

        let response = send(
            app,
            json_request("POST", "/api/v1/annotate", json!({ "content": content })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["links"][0]["number"], 1);
        assert_eq!(body["links"][0]["url"], "https://example.com/page");
        assert_eq!(body["links"][0]["title"], "Example Page");
        let html = body["html"].as_str().unwrap();
        assert!(html.contains(r#"<sup class="ela-marker" data-number="1">1</sup>"#));
        assert!(html.contains(r#"<a href="/local">Local</a>"#));
    }

    #[tokio::test]
    async fn test_annotate_disabled() {
        let app = router(test_state(MockFetcher::new()).await);
        let content = r#"<a href="https://example.com/page">Example</a>"#;

        let response = send(
            app,
            json_request(
                "POST",
                "/api/v1/annotate",
                json!({ "content": content, "enabled": false }),
            ),
        )
        .await;

        let body = body_json(response).await;
        assert_eq!(body["html"], content);
        assert_eq!(body["links"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_classify() {
        let app = router(test_state(MockFetcher::new()).await);

        let response = send(
            app,
            json_request(
                "POST",
                "/api/v1/annotate/classify",
                json!({ "url": "https://example.com/video.mp4" }),
            ),
        )
        .await;

        let body = body_json(response).await;
        assert_eq!(body["external"], false);
    }

    #[tokio::test]
    async fn test_resolve_title() {
        let fetcher = MockFetcher::new().with_title("https://example.com/", "Example");
        let app = router(test_state(fetcher).await);

        let response = send(
            app,
            empty_request("GET", "/api/v1/annotate/title?url=https%3A%2F%2Fexample.com%2F"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Example");
    }

    #[tokio::test]
    async fn test_resolve_title_rejects_relative_url() {
        let app = router(test_state(MockFetcher::new()).await);

        let response = send(app, empty_request("GET", "/api/v1/annotate/title?url=%2Flocal")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_public_hosts() {
        assert!(public("https://example.com/page"));
        assert!(public("http://93.184.216.34/"));
        assert!(public("http://[2606:2800:220:1::]/"));
    }

    #[test]
    fn test_local_hosts() {
        assert!(!public("http://localhost:8080/"));
        assert!(!public("http://LOCALHOST./"));
        assert!(!public("http://admin.localhost/"));
        assert!(!public("http://127.0.0.1/"));
        assert!(!public("http://10.0.0.5/"));
        assert!(!public("http://192.168.1.1/"));
        assert!(!public("http://169.254.169.254/latest/meta-data/"));
        assert!(!public("http://0.0.0.0/"));
        assert!(!public("http://[::1]/"));
        assert!(!public("http://[fe80::1]/"));
        assert!(!public("http://[fd00::1]/"));
        assert!(!public("http://[::ffff:127.0.0.1]/"));
    }

    #[tokio::test]
    async fn test_resolve_title_rejects_local_host() {
        let fetcher = MockFetcher::new().with_title("http://169.254.169.254/", "Metadata");
        let app = router(test_state(fetcher).await);

        let response = send(
            app,
            empty_request("GET", "/api/v1/annotate/title?url=http%3A%2F%2F169.254.169.254%2F"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
