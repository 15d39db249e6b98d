//! Analytics event payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form event properties.
pub type Properties = Map<String, Value>;

pub const PAGEVIEW: &str = "$pageview";
pub const PAGELEAVE: &str = "$pageleave";
pub const IDENTIFY: &str = "$identify";
pub const SET: &str = "$set";

/// Library name reported on every event.
pub const LIB_NAME: &str = "analytics-relay";

/// One event as accepted by the ingestion `capture` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub api_key: String,
    pub event: String,
    pub distinct_id: String,
    pub properties: Properties,
}

impl CaptureEvent {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
