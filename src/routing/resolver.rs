//! Endpoint resolution.
//!
//! # Responsibilities
//! - Store compiled operations by name
//! - Map (operation name, path parameters) to an absolute backend URL
//! - Fail loudly when the backend base URL is not configured
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Pure function of its inputs; no environment reads at request time
//! - Explicit errors rather than a silent default host

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::config::validation::check_base_url;
use crate::routing::operation::{OperationDescriptor, RoutingError};

/// Failure resolving an operation to a backend URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("backend base URL is not configured")]
    BaseUrlMissing,

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("operation '{operation}' requires parameter '{parameter}'")]
    MissingParameter { operation: String, parameter: String },

    #[error("operation '{operation}': parameter '{parameter}' has an invalid value")]
    InvalidParameter { operation: String, parameter: String },

    #[error("base URL '{0}' cannot carry a backend path")]
    InvalidUrl(String),
}

/// Resolves logical operations to backend URLs.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    base_url: Option<Url>,
    operations: BTreeMap<String, Arc<OperationDescriptor>>,
}

impl EndpointResolver {
    pub fn new(base_url: Option<Url>, operations: Vec<OperationDescriptor>) -> Self {
        let operations = operations
            .into_iter()
            .map(|op| (op.name.clone(), Arc::new(op)))
            .collect();
        Self {
            base_url,
            operations,
        }
    }

    /// Compile the operation table and base URL from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RoutingError> {
        let base_url = match &config.backend.base_url {
            Some(raw) => Some(check_base_url(raw).map_err(|reason| {
                RoutingError::InvalidBaseUrl {
                    url: raw.clone(),
                    reason,
                }
            })?),
            None => None,
        };

        let operations = config
            .operations
            .iter()
            .map(OperationDescriptor::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(base_url, operations))
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn operation(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.operations.get(name)
    }

    /// Operations ordered by name.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<OperationDescriptor>> {
        self.operations.values()
    }

    /// Build the absolute backend URL for `name` with `params` substituted.
    pub fn resolve(&self, name: &str, params: &HashMap<String, String>) -> Result<Url, ResolveError> {
        let base = self.base_url.as_ref().ok_or(ResolveError::BaseUrlMissing)?;
        let op = self
            .operations
            .get(name)
            .ok_or_else(|| ResolveError::UnknownOperation(name.to_string()))?;

        for parameter in op.backend_path.parameters() {
            match params.get(parameter).map(String::as_str) {
                None => {
                    return Err(ResolveError::MissingParameter {
                        operation: op.name.clone(),
                        parameter: parameter.to_string(),
                    })
                }
                Some("" | "." | "..") => {
                    return Err(ResolveError::InvalidParameter {
                        operation: op.name.clone(),
                        parameter: parameter.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        let segments = op
            .backend_path
            .render_segments(params)
            .map_err(|parameter| ResolveError::MissingParameter {
                operation: op.name.clone(),
                parameter,
            })?;

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ResolveError::InvalidUrl(base.to_string()))?;
            path.pop_if_empty();
            path.extend(segments.iter());
        }
        Ok(url)
    }
}
