//! Admin console gateway.
//!
//! Accepts administrative requests (categories, workouts, video uploads,
//! users, CMS pages), forwards each to the configured backend with the
//! caller's credential, and relays the backend's answer unchanged.

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, StartupError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
