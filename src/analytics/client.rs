//! Analytics client.
//!
//! # Responsibilities
//! - Hold the current identity (anonymous or identified distinct ID)
//! - Enrich events with library and person-profile properties
//! - Deliver events in order to the ingestion `capture` endpoint
//!
//! # Design Decisions
//! - Callers never wait on the network: events go through an unbounded
//!   channel to a single delivery task
//! - Delivery failures are logged and dropped, never retried
//! - Identity is swapped atomically, so clones share one identity

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use url::Url;
use uuid::Uuid;

use crate::analytics::event::{CaptureEvent, Properties, IDENTIFY, LIB_NAME, SET};
use crate::config::{AnalyticsConfig, PersonProfiles};

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("invalid analytics host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build analytics HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    distinct_id: String,
    identified: bool,
}

impl Identity {
    fn anonymous() -> Self {
        Self {
            distinct_id: Uuid::new_v4().to_string(),
            identified: false,
        }
    }
}

enum Envelope {
    Event(CaptureEvent),
    Flush(oneshot::Sender<()>),
}

struct Inner {
    api_key: String,
    ui_host: Url,
    person_profiles: PersonProfiles,
    debug: AtomicBool,
    identity: ArcSwap<Identity>,
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Handle to an initialized analytics client. Cheap to clone.
#[derive(Clone)]
pub struct PostHogClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PostHogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostHogClient")
            .field("distinct_id", &self.distinct_id())
            .field("person_profiles", &self.inner.person_profiles)
            .finish_non_exhaustive()
    }
}

impl PostHogClient {
    /// Build the client and spawn its delivery task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(api_key: &str, config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let capture_url = endpoint(&config.ingestion_host, "capture/")?;
        let ui_host = parse_host(&config.ui_host)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver(http, capture_url.clone(), rx));

        tracing::info!(
            capture_url = %capture_url,
            person_profiles = ?config.person_profiles,
            "Analytics client initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                api_key: api_key.to_string(),
                ui_host,
                person_profiles: config.person_profiles,
                debug: AtomicBool::new(false),
                identity: ArcSwap::from_pointee(Identity::anonymous()),
                tx,
            }),
        })
    }

    /// Log every queued event at info level.
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    pub fn distinct_id(&self) -> String {
        self.inner.identity.load().distinct_id.clone()
    }

    pub fn is_identified(&self) -> bool {
        self.inner.identity.load().identified
    }

    /// Queue an event for the current identity.
    pub fn capture(&self, event: &str, properties: Option<Properties>) {
        self.enqueue(event, properties.unwrap_or_default());
    }

    /// Attach subsequent events to `distinct_id`.
    ///
    /// From an anonymous identity this sends `$identify` linking the
    /// anonymous ID. From an identified one it only switches the ID (or
    /// keeps it) and sends `$set` when properties are given: two identified
    /// people are never merged.
    pub fn identify(&self, distinct_id: &str, properties: Option<Properties>) {
        if self.inner.person_profiles == PersonProfiles::Never {
            tracing::warn!("identify ignored: person profiles are disabled");
            return;
        }
        let distinct_id = distinct_id.trim();
        if distinct_id.is_empty() {
            tracing::warn!("identify ignored: empty distinct ID");
            return;
        }

        let previous = self.inner.identity.load_full();
        if !previous.identified || previous.distinct_id != distinct_id {
            self.inner.identity.store(Arc::new(Identity {
                distinct_id: distinct_id.to_string(),
                identified: true,
            }));
        }

        if previous.identified {
            if let Some(set) = properties {
                let mut props = Properties::new();
                props.insert(SET.to_string(), Value::Object(set));
                self.enqueue(SET, props);
            }
            return;
        }

        let mut props = Properties::new();
        props.insert(
            "$anon_distinct_id".to_string(),
            Value::String(previous.distinct_id.clone()),
        );
        if let Some(set) = properties {
            props.insert(SET.to_string(), Value::Object(set));
        }
        self.enqueue(IDENTIFY, props);
    }

    /// Forget the current user and start a new anonymous identity.
    pub fn reset(&self) {
        self.inner.identity.store(Arc::new(Identity::anonymous()));
        if self.is_debug() {
            tracing::info!(distinct_id = %self.distinct_id(), "Analytics identity reset");
        }
    }

    /// Wait until every event queued so far has been delivered (or dropped).
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.inner.tx.send(Envelope::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Link to a person in the analytics UI.
    pub fn person_url(&self, distinct_id: &str) -> String {
        format!(
            "{}/person/{}",
            self.inner.ui_host.as_str().trim_end_matches('/'),
            distinct_id
        )
    }

    fn process_person_profile(&self, identified: bool) -> bool {
        match self.inner.person_profiles {
            PersonProfiles::Always => true,
            PersonProfiles::Never => false,
            PersonProfiles::IdentifiedOnly => identified,
        }
    }

    fn enqueue(&self, event: &str, mut properties: Properties) {
        let identity = self.inner.identity.load_full();

        properties.insert("$lib".to_string(), Value::from(LIB_NAME));
        properties.insert("$lib_version".to_string(), Value::from(env!("CARGO_PKG_VERSION")));
        properties.insert(
            "$process_person_profile".to_string(),
            Value::Bool(self.process_person_profile(identity.identified)),
        );

        let event = CaptureEvent {
            api_key: self.inner.api_key.clone(),
            event: event.to_string(),
            distinct_id: identity.distinct_id.clone(),
            properties,
        };

        if self.is_debug() {
            tracing::info!(event = %event.event, distinct_id = %event.distinct_id, "Analytics event queued");
        } else {
            tracing::trace!(event = %event.event, "Analytics event queued");
        }

        if self.inner.tx.send(Envelope::Event(event)).is_err() {
            tracing::warn!("Analytics delivery task has stopped; event dropped");
        }
    }
}

async fn deliver(http: reqwest::Client, url: Url, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Event(event) => send_event(&http, &url, &event).await,
            Envelope::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("Analytics delivery task finished");
}

async fn send_event(http: &reqwest::Client, url: &Url, event: &CaptureEvent) {
    match http.post(url.clone()).json(event).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::trace!(event = %event.event, "Analytics event delivered");
        }
        Ok(response) => {
            tracing::warn!(event = %event.event, status = %response.status(), "Analytics event rejected");
        }
        Err(e) => {
            tracing::warn!(event = %event.event, error = %e, "Analytics event delivery failed");
        }
    }
}

fn parse_host(host: &str) -> Result<Url, AnalyticsError> {
    Url::parse(host).map_err(|source| AnalyticsError::InvalidHost {
        host: host.to_string(),
        source,
    })
}

/// `<host>/<path>`, keeping any path prefix on the host (e.g. a relay mount).
fn endpoint(host: &str, path: &str) -> Result<Url, AnalyticsError> {
    parse_host(&format!("{}/{}", host.trim_end_matches('/'), path))
}
