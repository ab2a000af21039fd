//! Operation descriptors and path templates.
//!
//! # Responsibilities
//! - Parse `{param}` path templates for gateway routes and backend paths
//! - Render backend path segments from captured route parameters
//! - Carry the per-operation method translation (inbound → outbound)
//!
//! # Design Decisions
//! - Placeholders are plain identifiers; no regex, no wildcards
//! - Rendering yields raw segments; the resolver percent-encodes them,
//!   so a parameter value can never add a path segment or a query

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::OperationConfig;

/// Template parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{template}' has an unclosed '{{'")]
    Unclosed { template: String },

    #[error("template '{template}' has an unexpected '}}'")]
    UnexpectedBrace { template: String },

    #[error("template '{template}' has an invalid placeholder name '{name}'")]
    InvalidName { template: String, name: String },
}

/// Failure compiling an operation from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("operation '{name}': invalid method '{method}'")]
    InvalidMethod { name: String, method: String },

    #[error("operation '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },

    #[error("backend base URL '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

/// A slash-separated path with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Vec<Part>>,
}

impl PathTemplate {
    /// Parse a template such as `/categories/{id}/delete`.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|segment| parse_segment(raw, segment))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|part| match part {
            Part::Param(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    pub fn has_parameters(&self) -> bool {
        self.parameters().next().is_some()
    }

    /// True when every placeholder occupies a whole segment.
    pub fn params_span_segments(&self) -> bool {
        self.segments.iter().all(|segment| {
            segment.len() == 1 || !segment.iter().any(|p| matches!(p, Part::Param(_)))
        })
    }

    /// Route shape with placeholder names erased, for conflict detection.
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            for part in segment {
                match part {
                    Part::Literal(text) => shape.push_str(text),
                    Part::Param(_) => shape.push_str("{}"),
                }
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    /// Whole-segment placeholders paired with the shape of the path before them.
    ///
    /// The router requires placeholders at the same position under the same
    /// prefix to share a name.
    pub fn placeholder_positions(&self) -> Vec<(String, &str)> {
        let mut positions = Vec::new();
        let mut prefix = String::new();
        for segment in &self.segments {
            if let [Part::Param(name)] = segment.as_slice() {
                positions.push((prefix.clone(), name.as_str()));
            }
            prefix.push('/');
            for part in segment {
                match part {
                    Part::Literal(text) => prefix.push_str(text),
                    Part::Param(_) => prefix.push_str("{}"),
                }
            }
        }
        positions
    }

    /// Substitute parameters, returning unencoded path segments.
    ///
    /// Fails with the name of the first placeholder that has no value.
    pub fn render_segments(&self, params: &HashMap<String, String>) -> Result<Vec<String>, String> {
        self.segments
            .iter()
            .map(|segment| -> Result<String, String> {
                let mut rendered = String::new();
                for part in segment {
                    match part {
                        Part::Literal(text) => rendered.push_str(text),
                        Part::Param(name) => {
                            let value = params.get(name).ok_or_else(|| name.clone())?;
                            rendered.push_str(value);
                        }
                    }
                }
                Ok(rendered)
            })
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(template: &str, segment: &str) -> Result<Vec<Part>, TemplateError> {
    let mut parts = Vec::new();
    let mut rest = segment;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                parts.push(Part::Literal(rest.to_string()));
                break;
            }
            Some(pos) if rest[pos..].starts_with('}') => {
                return Err(TemplateError::UnexpectedBrace {
                    template: template.to_string(),
                });
            }
            Some(pos) => {
                if pos > 0 {
                    parts.push(Part::Literal(rest[..pos].to_string()));
                }
                let after = &rest[pos + 1..];
                let end = after.find('}').ok_or_else(|| TemplateError::Unclosed {
                    template: template.to_string(),
                })?;
                let name = &after[..end];
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(TemplateError::InvalidName {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                parts.push(Part::Param(name.to_string()));
                rest = &after[end + 1..];
            }
        }
    }

    if parts.is_empty() {
        parts.push(Part::Literal(String::new()));
    }
    Ok(parts)
}

/// A compiled gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub route: PathTemplate,
    pub inbound_method: Method,
    /// May differ from `inbound_method` where the backend expects it.
    pub outbound_method: Method,
    pub backend_path: PathTemplate,
    /// Per-operation deadline; `None` uses the backend default.
    pub timeout: Option<Duration>,
}

impl OperationDescriptor {
    pub fn from_config(config: &OperationConfig) -> Result<Self, RoutingError> {
        let method = |raw: &str| {
            raw.to_ascii_uppercase()
                .parse::<Method>()
                .map_err(|_| RoutingError::InvalidMethod {
                    name: config.name.clone(),
                    method: raw.to_string(),
                })
        };
        let template = |raw: &str| {
            PathTemplate::parse(raw).map_err(|source| RoutingError::Template {
                name: config.name.clone(),
                source,
            })
        };

        let inbound_method = method(&config.inbound_method)?;
        let outbound_method = match &config.outbound_method {
            Some(raw) => method(raw)?,
            None => inbound_method.clone(),
        };

        Ok(Self {
            name: config.name.clone(),
            route: template(&config.route)?,
            inbound_method,
            outbound_method,
            backend_path: template(&config.backend_path)?,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    /// True when the gateway translates the method on the way out.
    pub fn translates_method(&self) -> bool {
        self.inbound_method != self.outbound_method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_and_parameters() {
        let t = PathTemplate::parse("/workouts/{workout_id}/videos/{id}").unwrap();
        assert_eq!(t.parameters().collect::<Vec<_>>(), vec!["workout_id", "id"]);
        assert!(t.params_span_segments());
        assert_eq!(t.shape(), "/workouts/{}/videos/{}");
        assert_eq!(t.to_string(), "/workouts/{workout_id}/videos/{id}");
    }

    #[test]
    fn test_root_and_literal_templates() {
        let root = PathTemplate::parse("/").unwrap();
        assert_eq!(root.shape(), "/");
        assert!(root.render_segments(&HashMap::new()).unwrap().is_empty());

        let t = PathTemplate::parse("/categories").unwrap();
        assert!(!t.has_parameters());
        assert_eq!(t.render_segments(&HashMap::new()).unwrap(), vec!["categories"]);
    }

    #[test]
    fn test_mixed_segment() {
        let t = PathTemplate::parse("/media/{id}.mp4").unwrap();
        assert!(!t.params_span_segments());
        assert_eq!(
            t.render_segments(&params(&[("id", "42")])).unwrap(),
            vec!["media", "42.mp4"]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PathTemplate::parse("/a/{id"),
            Err(TemplateError::Unclosed { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/id}"),
            Err(TemplateError::UnexpectedBrace { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/{}"),
            Err(TemplateError::InvalidName { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/{some-id}"),
            Err(TemplateError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_render_missing_parameter() {
        let t = PathTemplate::parse("/categories/{id}/delete").unwrap();
        assert_eq!(t.render_segments(&HashMap::new()), Err("id".to_string()));
    }

    #[test]
    fn test_descriptor_method_translation() {
        let config = OperationConfig::new(
            "delete-category",
            "delete",
            "/api/categories/{id}",
            "POST",
            "/categories/{id}/delete",
        );
        let op = OperationDescriptor::from_config(&config).unwrap();
        assert_eq!(op.inbound_method, Method::DELETE);
        assert_eq!(op.outbound_method, Method::POST);
        assert!(op.translates_method());
    }

    #[test]
    fn test_descriptor_outbound_defaults_to_inbound() {
        let config = OperationConfig {
            outbound_method: None,
            ..OperationConfig::new("get-user", "GET", "/api/users/{id}", "GET", "/users/{id}")
        };
        let op = OperationDescriptor::from_config(&config).unwrap();
        assert_eq!(op.outbound_method, Method::GET);
        assert!(!op.translates_method());
        assert_eq!(op.timeout, None);

        let op = OperationDescriptor::from_config(&config.with_timeout(600)).unwrap();
        assert_eq!(op.timeout, Some(Duration::from_secs(600)));
    }
}
