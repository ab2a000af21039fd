//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the caller sent none
//! - Select the inbound headers that may reach the backend
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Header forwarding is an allow-list; nothing passes by default except
//!   what the config names (`authorization` out of the box)
//! - No credential is ever injected when the caller sent none

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Issues UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Parse the configured allow-list, skipping names that do not parse.
pub fn allowed_header_names(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect()
}

/// Headers sent to the backend for one request.
///
/// Copies allow-listed inbound headers verbatim (all values, in order).
/// When a body is forwarded, its `content-type` travels with it.
pub fn outbound_headers(inbound: &HeaderMap, allowed: &[HeaderName], has_body: bool) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for name in allowed {
        for value in inbound.get_all(name) {
            outbound.append(name.clone(), value.clone());
        }
    }

    if has_body && !outbound.contains_key(header::CONTENT_TYPE) {
        if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
            outbound.insert(header::CONTENT_TYPE, content_type.clone());
        }
    }

    outbound
}
