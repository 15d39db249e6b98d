//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handlers, analytics client, config reload:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace span of every request
//! - Metrics are cheap and disabled unless configured

pub mod logging;
pub mod metrics;
