//! Outbound HTTP client for the backend service.
//!
//! # Responsibilities
//! - Keep a pooled `reqwest` client with bounded connect/request timeouts
//! - Send exactly one request per call (no retries)
//! - Buffer the full backend response (no streaming pass-through)
//! - Classify transport failures
//!
//! # Design Decisions
//! - Redirects are not followed; a 3xx from the backend is relayed as-is
//! - Timeouts come from config; every backend call has a deadline
//! - HTTP error statuses are NOT errors here; they are relayed

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::config::schema::BackendConfig;

/// Transport-level failure talking to the backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("backend request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("failed to connect to backend")]
    Connect(#[source] reqwest::Error),

    #[error("malformed backend response")]
    Malformed(#[source] reqwest::Error),

    #[error("backend request failed")]
    Request(#[source] reqwest::Error),

    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),
}

impl UpstreamError {
    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err)
        } else if err.is_connect() {
            UpstreamError::Connect(err)
        } else if err.is_body() || err.is_decode() {
            UpstreamError::Malformed(err)
        } else {
            UpstreamError::Request(err)
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Connect(_) => "connect",
            UpstreamError::Malformed(_) => "malformed",
            UpstreamError::Request(_) => "request",
            UpstreamError::Build(_) => "build",
        }
    }
}

/// A fully buffered backend response.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Pooled client for backend calls.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new(config: &BackendConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .tcp_nodelay(true)
            .build()
            .map_err(UpstreamError::Build)?;

        Ok(Self { client })
    }

    /// Send one request and buffer the response.
    ///
    /// `timeout` replaces the client-wide request timeout for this call. It
    /// covers uploading `body` as well as reading the response.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
        timeout: Option<Duration>,
    ) -> Result<BackendResponse, UpstreamError> {
        let mut request = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(UpstreamError::classify)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(UpstreamError::classify)?;

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with_timeout(secs: u64) -> UpstreamClient {
        UpstreamClient::new(&BackendConfig {
            request_timeout_secs: secs,
            ..BackendConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_buffers_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/categories"))
            .and(body_string("{\"name\":\"Yoga\"}"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_raw("{\"id\":7}", "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/categories", server.uri())).unwrap();
        let response = client_with_timeout(5)
            .send(
                Method::POST,
                url,
                HeaderMap::new(),
                Bytes::from_static(b"{\"name\":\"Yoga\"}"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.content_type.unwrap(), "application/json");
        assert_eq!(&response.body[..], b"{\"id\":7}");
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let response = client_with_timeout(5)
            .send(Method::GET, url, HeaderMap::new(), Bytes::new(), None)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = client_with_timeout(1)
            .send(Method::GET, url, HeaderMap::new(), Bytes::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_per_call_timeout_overrides_client_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_millis(1500)))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let response = client_with_timeout(1)
            .send(
                Method::POST,
                url,
                HeaderMap::new(),
                Bytes::from_static(b"video"),
                Some(Duration::from_secs(5)),
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/categories")).unwrap();
        let err = client_with_timeout(5)
            .send(Method::GET, url, HeaderMap::new(), Bytes::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "connect");
    }
}
