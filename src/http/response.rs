//! Response relay.
//!
//! # Responsibilities
//! - Classify the backend content type once per response
//! - Re-emit the backend body with the backend status code
//!
//! # Design Decisions
//! - Only `content-type` is inspected; JSON is checked for well-formedness
//!   and relayed byte-for-byte (key order and number precision intact)
//! - Relay is total over `ContentKind`
//! - A body that claims JSON but does not decode is a malformed response

use axum::body::Body;
use axum::http::{header, HeaderValue, Response};
use serde::de::IgnoredAny;

use crate::error::GatewayError;
use crate::upstream::BackendResponse;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// How a backend body is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// JSON: validated, then relayed as received.
    Structured,
    /// Anything textual, including a missing content type.
    Text,
    /// Binary media: bytes relayed untouched.
    Unsupported,
}

impl ContentKind {
    pub fn classify(content_type: Option<&HeaderValue>) -> Self {
        let Some(media) = content_type
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
        else {
            return ContentKind::Text;
        };

        if media == "application/json" || media.ends_with("+json") {
            return ContentKind::Structured;
        }

        let (kind, subtype) = media.split_once('/').unwrap_or((media.as_str(), ""));
        match kind {
            "image" | "audio" | "video" => ContentKind::Unsupported,
            "application"
                if matches!(subtype, "octet-stream" | "pdf" | "zip" | "gzip") =>
            {
                ContentKind::Unsupported
            }
            _ => ContentKind::Text,
        }
    }
}

/// Turn a buffered backend response into the gateway's response.
pub fn relay(backend: BackendResponse) -> Result<Response<Body>, GatewayError> {
    let BackendResponse {
        status,
        content_type,
        body,
    } = backend;

    let kind = ContentKind::classify(content_type.as_ref());
    let mut response = match kind {
        ContentKind::Structured if body.iter().all(u8::is_ascii_whitespace) => {
            Response::new(Body::empty())
        }
        ContentKind::Structured => {
            serde_json::from_slice::<IgnoredAny>(&body)?;
            let mut response = Response::new(Body::from(body));
            if let Some(content_type) = content_type {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        ContentKind::Text => {
            let text = String::from_utf8_lossy(&body).into_owned();
            let mut response = Response::new(Body::from(text));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(TEXT_CONTENT_TYPE),
            );
            response
        }
        ContentKind::Unsupported => {
            let mut response = Response::new(Body::from(body));
            if let Some(content_type) = content_type {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
    };

    *response.status_mut() = status;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::StatusCode;

    fn backend(status: u16, content_type: Option<&'static str>, body: &'static [u8]) -> BackendResponse {
        BackendResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(HeaderValue::from_static),
            body: Bytes::from_static(body),
        }
    }

    async fn body_of(response: Response<Body>) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[test]
    fn test_classify() {
        let kind = |ct: &'static str| ContentKind::classify(Some(&HeaderValue::from_static(ct)));

        assert_eq!(kind("application/json"), ContentKind::Structured);
        assert_eq!(kind("application/json; charset=utf-8"), ContentKind::Structured);
        assert_eq!(kind("Application/JSON"), ContentKind::Structured);
        assert_eq!(kind("application/problem+json"), ContentKind::Structured);
        assert_eq!(kind("text/plain"), ContentKind::Text);
        assert_eq!(kind("text/html; charset=utf-8"), ContentKind::Text);
        assert_eq!(kind("application/xml"), ContentKind::Text);
        assert_eq!(kind("video/mp4"), ContentKind::Unsupported);
        assert_eq!(kind("image/png"), ContentKind::Unsupported);
        assert_eq!(kind("application/octet-stream"), ContentKind::Unsupported);
        assert_eq!(ContentKind::classify(None), ContentKind::Text);
    }

    #[tokio::test]
    async fn test_relay_json() {
        let response = relay(backend(200, Some("application/json"), br#"{"ok":true}"#)).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_relay_json_keeps_key_order_and_precision() {
        let raw: &'static [u8] = br#"{"name":"Ann","id":7,"big":12345678901234567890123,"ratio":0.10}"#;
        let response = relay(backend(200, Some("application/json; charset=utf-8"), raw)).unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(&body_of(response).await[..], raw);
    }

    #[test]
    fn test_relay_json_rejects_trailing_garbage() {
        let err = relay(backend(200, Some("application/json"), br#"{"ok":true} tail"#)).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn test_relay_text() {
        let response = relay(backend(200, Some("text/plain"), b"deleted")).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            TEXT_CONTENT_TYPE
        );
        assert_eq!(&body_of(response).await[..], b"deleted");
    }

    #[tokio::test]
    async fn test_relay_error_status_passes_through() {
        let response =
            relay(backend(404, Some("application/json"), br#"{"error":"not found"}"#)).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "not found" }));
    }

    #[tokio::test]
    async fn test_relay_empty_json_body() {
        let response = relay(backend(204, Some("application/json"), b"")).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_relay_binary_untouched() {
        let response = relay(backend(200, Some("video/mp4"), &[0, 159, 146, 150])).unwrap();
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp4");
        assert_eq!(&body_of(response).await[..], &[0, 159, 146, 150]);
    }

    #[test]
    fn test_relay_malformed_json_is_error() {
        let err = relay(backend(200, Some("application/json"), b"<html>")).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedJson(_)));
    }
}
