//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream origins are absolute http(s) URLs
//! - Validate the mount path and bind address
//! - Validate analytics hosts when analytics is enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are both required",
            ));
        }
    }

    let mount = &config.relay.mount_path;
    if !mount.starts_with('/') {
        errors.push(ValidationError::new("relay.mount_path", "must start with '/'"));
    } else if mount.len() > 1 && mount.ends_with('/') {
        errors.push(ValidationError::new("relay.mount_path", "must not end with '/'"));
    }
    if mount.contains('{') || mount.contains('}') || mount.contains('*') {
        errors.push(ValidationError::new(
            "relay.mount_path",
            "must be a literal path without captures",
        ));
    }

    check_origin(&mut errors, "relay.asset_origin", &config.relay.asset_origin);
    check_origin(&mut errors, "relay.event_origin", &config.relay.event_origin);

    if config.relay.max_body_size == 0 {
        errors.push(ValidationError::new("relay.max_body_size", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    // Hosts only matter once a key turns analytics on
    if config.analytics.key().is_some() {
        check_origin(&mut errors, "analytics.ingestion_host", &config.analytics.ingestion_host);
        check_origin(&mut errors, "analytics.ui_host", &config.analytics.ui_host);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::new(field, "scheme must be http or https"));
        }
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::new(field, "must include a host"));
        }
        Ok(url) if url.query().is_some() || url.fragment().is_some() => {
            errors.push(ValidationError::new(field, "must not carry a query or fragment"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}
