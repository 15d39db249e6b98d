//! Capture/identify/reset facade over an optional client.

use serde_json::Value;

use crate::analytics::client::PostHogClient;
use crate::analytics::event::{Properties, PAGELEAVE, PAGEVIEW};

/// The analytics entry point handed to call sites.
///
/// Without a client (no key configured) every operation is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Analytics {
    client: Option<PostHogClient>,
    capture_pageleave: bool,
}

impl Analytics {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(client: PostHogClient, capture_pageleave: bool) -> Self {
        Self {
            client: Some(client),
            capture_pageleave,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&PostHogClient> {
        self.client.as_ref()
    }

    pub fn capture(&self, event: &str, properties: Option<Properties>) {
        if let Some(client) = &self.client {
            client.capture(event, properties);
        }
    }

    pub fn identify(&self, distinct_id: &str, properties: Option<Properties>) {
        if let Some(client) = &self.client {
            client.identify(distinct_id, properties);
        }
    }

    pub fn reset(&self) {
        if let Some(client) = &self.client {
            client.reset();
        }
    }

    /// Post-navigation hook: record a pageview for the new full path.
    pub fn after_navigation(&self, full_path: &str) {
        self.capture(PAGEVIEW, Some(url_properties(full_path)));
    }

    /// Page-leave hook; honors the `capture_pageleave` setting.
    pub fn page_leave(&self, full_path: &str) {
        if self.capture_pageleave {
            self.capture(PAGELEAVE, Some(url_properties(full_path)));
        }
    }

    /// Wait for queued events to be delivered. Returns at once when disabled.
    pub async fn flush(&self) {
        if let Some(client) = &self.client {
            client.flush().await;
        }
    }
}

fn url_properties(full_path: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert("current_url".to_string(), Value::from(full_path));
    properties
}
