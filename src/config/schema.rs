//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the analytics relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Build mode; controls development-only behavior such as SDK debug logging.
    pub mode: BuildMode,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream origins and mount point of the relay.
    pub relay: RelaySettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Analytics client settings.
    pub analytics: AnalyticsConfig,
}

/// Build mode of the running application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    pub fn is_development(self) -> bool {
        self == BuildMode::Development
    }
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!("unknown build mode '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Relay configuration: where the relay is mounted and where it forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Path prefix the relay routes are mounted under (e.g., "/t").
    pub mount_path: String,

    /// Origin serving the SDK's static assets.
    pub asset_origin: String,

    /// Origin ingesting analytics events.
    pub event_origin: String,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            mount_path: "/t".to_string(),
            asset_origin: "https://us-assets.i.posthog.com".to_string(),
            event_origin: "https://us.i.posthog.com".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Which users get a person profile in the analytics backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonProfiles {
    #[default]
    IdentifiedOnly,
    Always,
    Never,
}

/// Analytics client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Project API key. Analytics is disabled when absent or empty.
    pub client_key: Option<String>,

    /// Ingestion endpoint events are sent to. May point at the relay itself.
    pub ingestion_host: String,

    /// Host of the analytics web UI.
    pub ui_host: String,

    /// Person profile processing mode.
    pub person_profiles: PersonProfiles,

    /// Capture a pageview automatically at startup.
    pub capture_pageview: bool,

    /// Capture page-leave events.
    pub capture_pageleave: bool,

    /// Enable SDK debug logging in development mode.
    pub debug_in_dev: bool,
}

impl AnalyticsConfig {
    /// The configured key, treating an empty string as absent.
    pub fn key(&self) -> Option<&str> {
        self.client_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            client_key: None,
            ingestion_host: "https://us.i.posthog.com".to_string(),
            ui_host: "https://us.posthog.com".to_string(),
            person_profiles: PersonProfiles::IdentifiedOnly,
            capture_pageview: false,
            capture_pageleave: true,
            debug_in_dev: true,
        }
    }
}
