//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, limits, one route per operation)
//!     → handler.rs (resolve backend URL, forward, relay)
//!         → request.rs (allow-listed headers)
//!         → upstream client (one backend call)
//!         → response.rs (classify content type, rebuild body)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ContentKind;
pub use server::{AppState, GatewayServer, GatewayState};
