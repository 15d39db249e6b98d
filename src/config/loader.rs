//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{BuildMode, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse TOML text, overlay the environment, and validate.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let mut config: RelayConfig = toml::from_str(content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the configuration from defaults plus environment overrides.
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    let mut config = RelayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay deployment-time settings from the environment.
///
/// `lookup` abstracts `std::env::var` so tests don't touch process state.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("POSTHOG_PUBLIC_KEY") {
        config.analytics.client_key = Some(key);
    }
    if let Some(host) = lookup("POSTHOG_HOST") {
        config.analytics.ingestion_host = host;
    }
    if let Some(host) = lookup("POSTHOG_UI_HOST") {
        config.analytics.ui_host = host;
    }
    if let Some(addr) = lookup("RELAY_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(mode) = lookup("RELAY_MODE") {
        match mode.parse::<BuildMode>() {
            Ok(mode) => config.mode = mode,
            Err(e) => tracing::warn!(error = %e, "Ignoring RELAY_MODE override"),
        }
    }
}
