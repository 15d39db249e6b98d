//! Product analytics client.
//!
//! # Data Flow
//! ```text
//! startup
//!     → bootstrap.rs (no key? disabled facade : build client, on_loaded hook)
//!
//! call sites
//!     → facade.rs (capture / identify / reset / after_navigation / page_leave)
//!     → client.rs (identity, enrichment, queue)
//!     → delivery task → POST <ingestion_host>/capture/
//! ```
//!
//! Pointing `ingestion_host` at the relay mount (e.g. `https://app.example.com/t`)
//! sends the client's own traffic through the first-party relay.

pub mod bootstrap;
pub mod client;
pub mod event;
pub mod facade;

pub use bootstrap::{bootstrap, bootstrap_with};
pub use client::{AnalyticsError, PostHogClient};
pub use event::{CaptureEvent, Properties};
pub use facade::Analytics;
