//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check operation integrity (methods parse, templates compile, placeholders line up)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};

use axum::http::{HeaderName, Method};
use axum::routing::MethodFilter;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, OperationConfig};
use crate::routing::operation::{PathTemplate, TemplateError};

/// Routes served by the gateway itself.
pub const RESERVED_ROUTES: &[&str] = &["/healthz"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend.base_url '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("operation '{name}': timeout_secs must be greater than zero")]
    ZeroOperationTimeout { name: String },

    #[error("operation #{index} has an empty name")]
    EmptyOperationName { index: usize },

    #[error("operation '{name}' is declared more than once")]
    DuplicateOperation { name: String },

    #[error("operation '{name}': invalid {which} method '{method}'")]
    InvalidMethod {
        name: String,
        which: &'static str,
        method: String,
    },

    #[error("operation '{name}': route '{route}' must start with '/'")]
    RelativeRoute { name: String, route: String },

    #[error("operation '{name}': route '{route}' is reserved")]
    ReservedRoute { name: String, route: String },

    #[error("operation '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },

    #[error("operation '{name}': route placeholders must span whole path segments")]
    PartialRouteSegment { name: String },

    #[error("operations '{first}' and '{second}' name the same route placeholder '{existing}' and '{parameter}'")]
    PlaceholderConflict {
        first: String,
        second: String,
        existing: String,
        parameter: String,
    },

    #[error("operation '{name}': backend placeholder '{{{parameter}}}' is not provided by the route")]
    UnboundParameter { name: String, parameter: String },

    #[error("operations '{first}' and '{second}' both accept {method} {route}")]
    ConflictingRoute {
        first: String,
        second: String,
        method: String,
        route: String,
    },

    #[error("forwarding.allowed_headers: '{header}' is not a valid header name")]
    InvalidHeaderName { header: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(url) = &config.backend.base_url {
        if let Err(reason) = check_base_url(url) {
            errors.push(ValidationError::InvalidBaseUrl {
                url: url.clone(),
                reason,
            });
        }
    }

    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "backend.connect_timeout_secs",
        });
    }
    if config.backend.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "backend.request_timeout_secs",
        });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "limits.max_body_bytes",
        });
    }

    validate_operations(&config.operations, &mut errors);

    for header in &config.forwarding.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                header: header.clone(),
            });
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that a base URL is an absolute http(s) URL usable as a prefix.
pub fn check_base_url(url: &str) -> Result<Url, String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", parsed.scheme()));
    }
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(parsed)
}

fn validate_operations(operations: &[OperationConfig], errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    // (route, inbound method) -> operation name
    let mut routes: Vec<(String, Method, String)> = Vec::new();
    // route prefix -> (placeholder name, operation name)
    let mut placeholders: HashMap<String, (String, String)> = HashMap::new();

    for (index, op) in operations.iter().enumerate() {
        if op.name.trim().is_empty() {
            errors.push(ValidationError::EmptyOperationName { index });
            continue;
        }
        if !names.insert(op.name.as_str()) {
            errors.push(ValidationError::DuplicateOperation {
                name: op.name.clone(),
            });
        }

        let inbound = parse_method(&op.name, "inbound", &op.inbound_method, errors)
            .and_then(|method| {
                // The router only dispatches on standard methods.
                if MethodFilter::try_from(method.clone()).is_ok() {
                    Some(method)
                } else {
                    errors.push(ValidationError::InvalidMethod {
                        name: op.name.clone(),
                        which: "inbound",
                        method: op.inbound_method.clone(),
                    });
                    None
                }
            });
        if let Some(outbound) = &op.outbound_method {
            parse_method(&op.name, "outbound", outbound, errors);
        }
        if op.timeout_secs == Some(0) {
            errors.push(ValidationError::ZeroOperationTimeout {
                name: op.name.clone(),
            });
        }

        if !op.route.starts_with('/') {
            errors.push(ValidationError::RelativeRoute {
                name: op.name.clone(),
                route: op.route.clone(),
            });
            continue;
        }
        if RESERVED_ROUTES.contains(&op.route.as_str()) {
            errors.push(ValidationError::ReservedRoute {
                name: op.name.clone(),
                route: op.route.clone(),
            });
        }

        let route = match PathTemplate::parse(&op.route) {
            Ok(t) => t,
            Err(source) => {
                errors.push(ValidationError::Template {
                    name: op.name.clone(),
                    source,
                });
                continue;
            }
        };
        if !route.params_span_segments() {
            errors.push(ValidationError::PartialRouteSegment {
                name: op.name.clone(),
            });
        }
        for (prefix, parameter) in route.placeholder_positions() {
            match placeholders.get(&prefix) {
                Some((existing, first)) if existing != parameter => {
                    errors.push(ValidationError::PlaceholderConflict {
                        first: first.clone(),
                        second: op.name.clone(),
                        existing: existing.clone(),
                        parameter: parameter.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    placeholders.insert(prefix, (parameter.to_string(), op.name.clone()));
                }
            }
        }

        match PathTemplate::parse(&op.backend_path) {
            Ok(backend) => {
                for parameter in backend.parameters() {
                    if !route.parameters().any(|p| p == parameter) {
                        errors.push(ValidationError::UnboundParameter {
                            name: op.name.clone(),
                            parameter: parameter.to_string(),
                        });
                    }
                }
            }
            Err(source) => errors.push(ValidationError::Template {
                name: op.name.clone(),
                source,
            }),
        }

        if let Some(method) = inbound {
            let shape = route.shape();
            if let Some((_, _, first)) = routes
                .iter()
                .find(|(r, m, _)| *r == shape && *m == method)
            {
                errors.push(ValidationError::ConflictingRoute {
                    first: first.clone(),
                    second: op.name.clone(),
                    method: method.to_string(),
                    route: op.route.clone(),
                });
            } else {
                routes.push((shape, method, op.name.clone()));
            }
        }
    }
}

fn parse_method(
    name: &str,
    which: &'static str,
    raw: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<Method> {
    match raw.to_ascii_uppercase().parse::<Method>() {
        Ok(method) => Some(method),
        Err(_) => {
            errors.push(ValidationError::InvalidMethod {
                name: name.to_string(),
                which,
                method: raw.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str, method: &str, route: &str, backend: &str) -> OperationConfig {
        OperationConfig::new(name, method, route, method, backend)
    }

    fn config_with(operations: Vec<OperationConfig>) -> GatewayConfig {
        GatewayConfig {
            operations,
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_base_url_checks() {
        assert!(check_base_url("http://localhost:4000").is_ok());
        assert!(check_base_url("https://api.example.com/v1/").is_ok());
        assert!(check_base_url("ftp://api.example.com").is_err());
        assert!(check_base_url("localhost:4000").is_err());
        assert!(check_base_url("").is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = config_with(vec![
            op("", "GET", "/a", "/a"),
            op("bad-method", "FETCH ME", "/b", "/b"),
            op("relative", "GET", "c", "/c"),
        ]);
        config.backend.connect_timeout_secs = 0;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyOperationName { index: 0 }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidMethod { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::RelativeRoute { .. })));
        assert!(errors.contains(&ValidationError::ZeroValue {
            field: "backend.connect_timeout_secs"
        }));
        assert!(errors.contains(&ValidationError::MissingAdminKey));
    }

    #[test]
    fn test_duplicate_names() {
        let config = config_with(vec![
            op("get-user", "GET", "/users/{id}", "/users/{id}"),
            op("get-user", "GET", "/people/{id}", "/people/{id}"),
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateOperation {
                name: "get-user".into()
            }]
        );
    }

    #[test]
    fn test_conflicting_routes_ignore_placeholder_names() {
        let config = config_with(vec![
            op("a", "GET", "/users/{id}", "/users/{id}"),
            op("b", "GET", "/users/{id}", "/people/{id}"),
            op("c", "PUT", "/users/{id}", "/users/{id}"),
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::ConflictingRoute { first, second, .. } if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_placeholder_names_must_agree() {
        let config = config_with(vec![
            op("a", "GET", "/users/{id}", "/users/{id}"),
            op("b", "PUT", "/users/{user_id}", "/users/{user_id}"),
            op("c", "GET", "/users/{id}/posts", "/users/{id}/posts"),
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::PlaceholderConflict {
                first: "a".into(),
                second: "b".into(),
                existing: "id".into(),
                parameter: "user_id".into(),
            }]
        );
    }

    #[test]
    fn test_unbound_backend_parameter() {
        let config = config_with(vec![op("x", "GET", "/things", "/things/{id}")]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnboundParameter {
                name: "x".into(),
                parameter: "id".into()
            }]
        );
    }

    #[test]
    fn test_zero_operation_timeout() {
        let config = config_with(vec![
            op("upload", "POST", "/uploads", "/uploads").with_timeout(0),
            op("slow", "GET", "/reports", "/reports").with_timeout(120),
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ZeroOperationTimeout {
                name: "upload".into()
            }]
        );
    }

    #[test]
    fn test_partial_route_segment_rejected() {
        let config = config_with(vec![op("x", "GET", "/files/{id}.mp4", "/files/{id}")]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::PartialRouteSegment { name: "x".into() }]);
    }

    #[test]
    fn test_reserved_route_and_bad_header() {
        let mut config = config_with(vec![op("x", "GET", "/healthz", "/health")]);
        config.forwarding.allowed_headers.push("bad header".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
