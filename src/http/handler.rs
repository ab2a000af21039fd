//! Proxy gateway handler.
//!
//! One inbound request → one backend call → one relayed response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Response};
use axum::response::IntoResponse;

use crate::error::GatewayError;
use crate::http::request::{outbound_headers, request_id};
use crate::http::response::relay;
use crate::http::server::GatewayState;
use crate::observability::metrics;
use crate::routing::ResolveError;

/// Forward `operation` to the backend and relay the result.
///
/// `state` is the snapshot the request was routed with; a reload while the
/// backend call is in flight does not affect it.
///
/// Transport and configuration failures are logged here and answered with
/// the fixed 500 payload; backend error statuses are relayed untouched.
pub async fn proxy(
    state: Arc<GatewayState>,
    operation: Arc<str>,
    params: HashMap<String, String>,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response<Body> {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        operation = %operation,
        "Proxying request"
    );

    match forward(&state, &operation, &params, query, &headers, body).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&operation, status.as_u16(), start_time);
            tracing::debug!(
                request_id = %request_id,
                operation = %operation,
                status = status.as_u16(),
                "Backend response relayed"
            );
            response
        }
        Err(err) => {
            metrics::record_upstream_error(&operation, err.kind());
            metrics::record_request(&operation, 500, start_time);
            tracing::error!(
                request_id = %request_id,
                operation = %operation,
                kind = err.kind(),
                error = ?err,
                "Proxy request failed"
            );
            err.into_response()
        }
    }
}

async fn forward(
    inner: &GatewayState,
    operation: &str,
    params: &HashMap<String, String>,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response<Body>, GatewayError> {
    let op = inner
        .resolver
        .operation(operation)
        .ok_or_else(|| ResolveError::UnknownOperation(operation.to_string()))?;

    let mut url = inner.resolver.resolve(operation, params)?;
    url.set_query(query.as_deref().filter(|q| !q.is_empty()));

    let outbound = outbound_headers(headers, &inner.allowed_headers, !body.is_empty());
    let backend = inner
        .upstream
        .send(op.outbound_method.clone(), url, outbound, body, op.timeout)
        .await?;

    relay(backend)
}
