//! First-party relay for product analytics traffic.
//!
//! Serves an analytics vendor's SDK assets and event ingestion from the
//! application's own domain, and provides the client used to emit events.

pub mod analytics;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;

pub use analytics::Analytics;
pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
