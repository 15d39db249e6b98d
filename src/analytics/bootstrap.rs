//! Client bootstrap and the post-initialization hook.

use crate::analytics::client::PostHogClient;
use crate::analytics::facade::Analytics;
use crate::config::{AnalyticsConfig, BuildMode};

/// Initialize analytics with the default post-initialization hook.
///
/// The default hook turns on debug logging in development mode when
/// `debug_in_dev` is set.
pub fn bootstrap(config: &AnalyticsConfig, mode: BuildMode) -> Analytics {
    bootstrap_with(config, |client| {
        if config.debug_in_dev && mode.is_development() {
            client.set_debug(true);
            tracing::info!("Analytics debug logging enabled");
        }
    })
}

/// Initialize analytics, running `on_loaded` once with the new client.
///
/// Without a client key nothing is built: no task, no network traffic,
/// and the returned facade ignores every call.
pub fn bootstrap_with<F>(config: &AnalyticsConfig, on_loaded: F) -> Analytics
where
    F: FnOnce(&PostHogClient),
{
    let Some(key) = config.key() else {
        tracing::info!("No analytics client key configured, analytics disabled");
        return Analytics::disabled();
    };

    let client = match PostHogClient::new(key, config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Analytics initialization failed, analytics disabled");
            return Analytics::disabled();
        }
    };

    on_loaded(&client);

    let analytics = Analytics::new(client, config.capture_pageleave);
    if config.capture_pageview {
        analytics.after_navigation("/");
    }
    analytics
}
