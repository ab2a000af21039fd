//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Operation table (config or catalog.rs)
//!     → operation.rs (compile methods and path templates)
//!     → resolver.rs (name → descriptor, base URL)
//!
//! Per request:
//!     (operation name, path params)
//!     → resolver.rs
//!     → Return: absolute backend URL or ResolveError
//! ```
//!
//! # Design Decisions
//! - Operations compiled at startup or reload, immutable afterwards; a
//!   reload builds a fresh resolver rather than mutating this one
//! - Inbound dispatch is axum's router; this module only owns the
//!   operation → backend mapping
//! - Deterministic: same input always resolves to the same URL

pub mod catalog;
pub mod operation;
pub mod resolver;

pub use operation::{OperationDescriptor, PathTemplate, RoutingError, TemplateError};
pub use resolver::{EndpointResolver, ResolveError};
