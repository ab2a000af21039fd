//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "GATEWAY_BACKEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// The backend URL from the environment, when set, replaces the file value.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate TOML already read from disk.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    finalize(config, std::env::var(BACKEND_URL_ENV).ok())
}

/// Build the configuration used when no file is given.
pub fn default_config() -> Result<GatewayConfig, ConfigError> {
    finalize(GatewayConfig::default(), std::env::var(BACKEND_URL_ENV).ok())
}

/// Apply overrides and run semantic validation.
pub fn finalize(
    mut config: GatewayConfig,
    backend_url: Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    apply_backend_override(&mut config, backend_url);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_backend_override(config: &mut GatewayConfig, backend_url: Option<String>) {
    if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
        config.backend.base_url = Some(url.trim().to_string());
    }
}
