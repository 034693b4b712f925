use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::Config;
use crate::storage::Quote;
use crate::store::QuoteError;
use crate::util::{sanitize_field, validate_endpoint, EndpointError};

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

/// Errors from a single sync round trip.
///
/// None of these are fatal: the periodic task reports them and tries again
/// on the next tick.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the expected JSON collection
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Configured endpoint is not a usable URL
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),
    /// Merged list could not be persisted
    #[error("Failed to persist merged quotes: {0}")]
    Storage(#[from] QuoteError),
}

/// Shape of one item in the remote collection.
///
/// JSONPlaceholder-style posts carry `title` (the quote text) plus fields we
/// ignore; a `category` is honoured when present.
#[derive(Debug, Deserialize)]
struct RemoteItem {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: Option<String>,
}

/// HTTP client bound to one remote collection.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: Url,
    default_category: String,
    timeout: Duration,
}

impl RemoteClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        default_category: &str,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            http,
            endpoint: validate_endpoint(endpoint)?,
            default_category: default_category.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("quoteshelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::new(
            http,
            &config.endpoint,
            &config.default_remote_category,
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// GET the remote collection and map it into quotes.
    ///
    /// Items whose title or category is blank after sanitizing are dropped.
    pub async fn fetch_quotes(&self) -> Result<Vec<Quote>, SyncError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.http.get(self.endpoint.clone()).send(),
        )
        .await
        .map_err(|_| SyncError::Timeout)??;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status().as_u16()));
        }

        let bytes = tokio::time::timeout(
            self.timeout,
            read_limited_bytes(response, MAX_RESPONSE_SIZE),
        )
        .await
        .map_err(|_| SyncError::Timeout)??;

        let items: Vec<RemoteItem> = serde_json::from_slice(&bytes)?;
        let total = items.len();
        let quotes: Vec<Quote> = items
            .into_iter()
            .map(|item| self.to_quote(item))
            .filter(Quote::is_valid)
            .collect();

        if quotes.len() < total {
            tracing::warn!(
                endpoint = %self.endpoint,
                skipped = total - quotes.len(),
                "Remote items without usable text skipped"
            );
        }
        tracing::debug!(endpoint = %self.endpoint, count = quotes.len(), "Fetched remote quotes");
        Ok(quotes)
    }

    /// POST one quote as JSON. Only the response status is inspected.
    pub async fn push_quote(&self, quote: &Quote) -> Result<u16, SyncError> {
        let body = serde_json::to_vec(quote)?;
        let response = tokio::time::timeout(
            self.timeout,
            self.http
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send(),
        )
        .await
        .map_err(|_| SyncError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    fn to_quote(&self, item: RemoteItem) -> Quote {
        let category = item
            .category
            .map(|c| sanitize_field(&c))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_category.clone());
        Quote {
            id: item.id,
            text: sanitize_field(&item.title),
            category,
        }
    }
}

/// Fire-and-forget push of a newly added quote.
///
/// The outcome is only logged; callers may await the handle in tests.
pub fn push_in_background(client: RemoteClient, quote: Quote) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client.push_quote(&quote).await {
            Ok(status) => {
                tracing::info!(status, text = %quote.text, "Pushed quote to remote");
            }
            Err(e) => {
                tracing::warn!(error = %e, text = %quote.text, "Failed to push quote to remote");
            }
        }
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SyncError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(SyncError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SyncError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RemoteClient {
        RemoteClient::new(
            reqwest::Client::new(),
            &format!("{}/posts", server.uri()),
            "Server",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_maps_title_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[
                    {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et"},
                    {"id": 2, "title": "qui est esse", "category": "Latin"}
                ]"#,
            ))
            .mount(&server)
            .await;

        let quotes = client_for(&server).fetch_quotes().await.unwrap();
        assert_eq!(
            quotes,
            vec![
                Quote::with_id(1, "sunt aut facere", "Server"),
                Quote::with_id(2, "qui est esse", "Latin"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_skips_blank_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"id": 1, "title": "  "}, {"id": 2}, {"id": 3, "title": "ok"}]"#),
            )
            .mount(&server)
            .await;

        let quotes = client_for(&server).fetch_quotes().await.unwrap();
        assert_eq!(quotes, vec![Quote::with_id(3, "ok", "Server")]);
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1) // no retry within a cycle
            .mount(&server)
            .await;

        match client_for(&server).fetch_quotes().await.unwrap_err() {
            SyncError::HttpStatus(503) => {}
            e => panic!("Expected HttpStatus(503), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).fetch_quotes().await,
            Err(SyncError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = RemoteClient::new(
            reqwest::Client::new(),
            &server.uri(),
            "Server",
            Duration::from_millis(50),
        )
        .unwrap();
        assert!(matches!(
            client.fetch_quotes().await,
            Err(SyncError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_push_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"text": "New", "category": "Mine"})))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 101}"#))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server)
            .push_quote(&Quote::new("New", "Mine"))
            .await
            .unwrap();
        assert_eq!(status, 201);
    }

    #[tokio::test]
    async fn test_push_in_background_survives_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        // Failure is logged, never surfaced
        push_in_background(client_for(&server), Quote::new("x", "y"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_http_endpoint() {
        let err = RemoteClient::new(
            reqwest::Client::new(),
            "ftp://example.com/posts",
            "Server",
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Endpoint(_)));
    }
}
