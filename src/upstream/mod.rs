//! Upstream (backend) subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved URL + outbound method + allow-listed headers + body
//!     → client.rs (pooled reqwest client, bounded timeouts)
//!     → BackendResponse { status, content_type, body }
//!       or UpstreamError { timeout | connect | malformed | request }
//! ```

pub mod client;

pub use client::{BackendResponse, UpstreamClient, UpstreamError};
