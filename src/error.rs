//! Error types at the gateway handler boundary.
//!
//! Only configuration and transport failures become local errors. Backend
//! 4xx/5xx responses are relayed and never reach this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::routing::{ResolveError, RoutingError};
use crate::upstream::UpstreamError;

/// Failure building the gateway from a configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Payload returned to the caller for any local failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

pub const CONFIGURATION_ERROR_MESSAGE: &str = "Gateway is not configured for this operation";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Failed to reach backend service";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Operation could not be mapped to a backend URL.
    #[error("configuration error: {0}")]
    Configuration(#[from] ResolveError),

    /// Backend could not be reached or answered with an unreadable response.
    #[error("transport error: {0}")]
    Transport(#[from] UpstreamError),

    /// Backend declared JSON but the body does not decode.
    #[error("malformed JSON from backend: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl GatewayError {
    /// Fixed message shown to the caller; failure detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => CONFIGURATION_ERROR_MESSAGE,
            GatewayError::Transport(_) | GatewayError::MalformedJson(_) => TRANSPORT_ERROR_MESSAGE,
        }
    }

    /// Label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => "configuration",
            GatewayError::Transport(e) => e.kind(),
            GatewayError::MalformedJson(_) => "malformed",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
