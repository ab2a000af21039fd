//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize, GATEWAY_BACKEND_URL override)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into the gateway state shared by all handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the compiled gateway state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError, BACKEND_URL_ENV};
pub use schema::{
    AdminConfig, BackendConfig, ForwardingConfig, GatewayConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, OperationConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
