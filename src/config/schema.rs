//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::catalog;

/// Root configuration for the admin gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Backend service the console delegates to.
    pub backend: BackendConfig,

    /// Operation table. Falls back to the built-in console catalog when absent.
    pub operations: Vec<OperationConfig>,

    /// Inbound header forwarding policy.
    pub forwarding: ForwardingConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backend: BackendConfig::default(),
            operations: catalog::default_operations(),
            forwarding: ForwardingConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Backend service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Absolute base URL of the backend (e.g., "http://api.internal:4000/v1").
    ///
    /// Left unset, every proxied operation fails with a configuration error
    /// instead of calling an invalid host.
    pub base_url: Option<String>,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for one backend call in seconds.
    pub request_timeout_secs: u64,

    /// Maximum idle pooled connections kept per backend host.
    pub pool_max_idle_per_host: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            pool_max_idle_per_host: 32,
        }
    }
}

/// A single proxied operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OperationConfig {
    /// Logical operation name (e.g., "delete-category").
    pub name: String,

    /// Inbound route on the gateway, with `{param}` placeholders.
    pub route: String,

    /// Method the gateway accepts on `route`.
    pub inbound_method: String,

    /// Method used for the backend call. Defaults to `inbound_method`.
    #[serde(default)]
    pub outbound_method: Option<String>,

    /// Backend path template appended to the base URL.
    pub backend_path: String,

    /// Overrides `backend.request_timeout_secs` for this operation.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl OperationConfig {
    pub fn new(
        name: &str,
        inbound_method: &str,
        route: &str,
        outbound_method: &str,
        backend_path: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            route: route.to_string(),
            inbound_method: inbound_method.to_string(),
            outbound_method: Some(outbound_method.to_string()),
            backend_path: backend_path.to_string(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Header forwarding policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Inbound headers copied to the backend request (case-insensitive).
    pub allowed_headers: Vec<String>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            allowed_headers: vec!["authorization".to_string()],
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes. Sized for workout video uploads.
    ///
    /// The operation timeout covers receiving the body and sending it on, so
    /// operations taking large bodies need a `timeout_secs` long enough for
    /// both legs of the transfer.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
