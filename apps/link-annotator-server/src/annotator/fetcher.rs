//! Page fetching for title resolution
//!
//! The resolver only needs the status code and body of a GET request, so
//! fetching sits behind [`TitleFetcher`]; tests swap in a scripted fetcher.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::config::FetchConfig;

/// Redirects followed before giving up
const MAX_REDIRECTS: usize = 5;

/// Fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Transport(String),
}

/// Status and body of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Source of page bodies for title extraction
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// GET `url`. Any HTTP status is a successful fetch.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher with a bounded timeout and body size
pub struct HttpTitleFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpTitleFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::from_builder(client_builder(config), config)
    }

    fn from_builder(
        builder: reqwest::ClientBuilder,
        config: &FetchConfig,
    ) -> Result<Self, FetchError> {
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

fn client_builder(config: &FetchConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(MAX_REDIRECTS))
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

/// Whether a Content-Type header value can carry a `<title>`
fn is_html_content_type(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    value.contains("html")
}

/// Encoding named by the `charset` parameter of a Content-Type value
fn charset_encoding(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
}

/// Decode a body prefix, preferring a BOM over the declared charset
///
/// Undeclared or unknown charsets decode as UTF-8.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type.and_then(charset_encoding).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[async_trait]
impl TitleFetcher for HttpTitleFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let html = content_type.as_deref().map(is_html_content_type).unwrap_or(true);

        if !html {
            tracing::debug!(url = %url, status, "Skipping non-HTML response body");
            return Ok(FetchedPage {
                status,
                body: String::new(),
            });
        }

        // The title lives in <head>, so a prefix of the body is enough
        let mut body = Vec::new();
        while body.len() < self.max_body_bytes {
            match response.chunk().await.map_err(transport_error)? {
                Some(chunk) => body.extend_from_slice(&chunk),
                None => break,
            }
        }
        body.truncate(self.max_body_bytes);

        Ok(FetchedPage {
            status,
            body: decode_body(&body, content_type.as_deref()),
        })
    }
}

/// Scripted fetcher for tests
#[cfg(test)]
pub struct MockFetcher {
    responses: std::collections::HashMap<String, FetchedPage>,
    calls: parking_lot::Mutex<Vec<String>>,
    delay: Option<Duration>,
}

#[cfg(test)]
impl MockFetcher {
    /// Unknown URLs fail with a transport error
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            calls: parking_lot::Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn with_title(self, url: &str, title: &str) -> Self {
        let body = format!("<html><head><title>{}</title></head><body></body></html>", title);
        self.with_page(url, 200, &body)
    }

    /// Sleep before answering every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| u.as_str() == url).count()
    }
}

#[cfg(test)]
#[async_trait]
impl TitleFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.lock().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("connection refused: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::annotator::{extract_title, TitleResolver};
    use crate::cache::{MemoryTitleCache, TitleCache};

    fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    /// Serve `response` to every connection, returning the base URL
    async fn serve(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let response = response.clone();
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let _ = socket.read(&mut request).await;
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}/", addr)
    }

    /// Accept connections and never answer
    async fn serve_silently() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        format!("http://{}/", addr)
    }

    fn fetcher(config: FetchConfig) -> HttpTitleFetcher {
        // Loopback servers must not go through an environment proxy
        HttpTitleFetcher::from_builder(client_builder(&config).no_proxy(), &config).unwrap()
    }

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("video/mp4"));
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_encoding("text/html; charset=ISO-8859-1"),
            Some(encoding_rs::WINDOWS_1252)
        );
        assert_eq!(
            charset_encoding(r#"text/html; foo=bar; charset="windows-1256""#),
            Some(encoding_rs::WINDOWS_1256)
        );
        assert_eq!(charset_encoding("text/html"), None);
        assert_eq!(charset_encoding("text/html; charset=not-a-charset"), None);
    }

    #[test]
    fn test_decode_body_defaults_to_utf8() {
        assert_eq!(decode_body("Caf\u{e9}".as_bytes(), None), "Caf\u{e9}");
        assert_eq!(decode_body(b"Caf\xE9", Some("text/html; charset=latin1")), "Caf\u{e9}");
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let fetcher = HttpTitleFetcher::new(&FetchConfig::default());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_decodes_declared_charset() {
        let url = serve(http_response(
            "200 OK",
            "text/html; charset=iso-8859-1",
            b"<html><head><title>Caf\xE9 Fran\xE7ais</title></head></html>",
        ))
        .await;

        let page = fetcher(FetchConfig::default()).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(extract_title(&page.body), Some("Caf\u{e9} Fran\u{e7}ais".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_utf8_without_charset() {
        let url = serve(http_response(
            "200 OK",
            "text/html",
            "<title>Caf\u{e9}</title>".as_bytes(),
        ))
        .await;

        let page = fetcher(FetchConfig::default()).fetch(&url).await.unwrap();

        assert_eq!(extract_title(&page.body), Some("Caf\u{e9}".to_string()));
    }

    #[tokio::test]
    async fn test_forbidden_page_resolves_to_fallback() {
        let url = serve(http_response(
            "403 Forbidden",
            "text/html",
            b"<title>Access Denied</title>",
        ))
        .await;
        let cache = MemoryTitleCache::new();
        let resolver = TitleResolver::new(
            Arc::new(cache.clone()),
            Arc::new(fetcher(FetchConfig::default())),
        );

        let title = resolver.resolve_title(&url, "Link text").await;

        assert_eq!(title, "Link text");
        assert_eq!(cache.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_body_is_capped() {
        let mut body = b"<html><head><!-- ".to_vec();
        body.extend(std::iter::repeat(b'x').take(4096));
        body.extend_from_slice(b" --><title>Too Late</title></head></html>");
        let url = serve(http_response("200 OK", "text/html", &body)).await;
        let config = FetchConfig {
            max_body_bytes: 1024,
            ..FetchConfig::default()
        };

        let page = fetcher(config).fetch(&url).await.unwrap();

        assert!(page.body.len() <= 1024);
        assert_eq!(extract_title(&page.body), None);
    }

    #[tokio::test]
    async fn test_non_html_body_is_skipped() {
        let url = serve(http_response(
            "200 OK",
            "application/pdf",
            b"%PDF-1.4 <title>Not a page</title>",
        ))
        .await;

        let page = fetcher(FetchConfig::default()).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert!(page.body.is_empty());
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let url = serve_silently().await;
        let config = FetchConfig {
            timeout_secs: 1,
            ..FetchConfig::default()
        };

        let result = fetcher(config).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let fetcher = MockFetcher::new().with_title("https://example.com", "Example");

        let page = fetcher.fetch("https://example.com").await.unwrap();
        let missing = fetcher.fetch("https://missing.example").await;

        assert_eq!(page.status, 200);
        assert!(page.body.contains("<title>Example</title>"));
        assert!(matches!(missing, Err(FetchError::Transport(_))));
        assert_eq!(fetcher.calls().len(), 2);
    }
}
