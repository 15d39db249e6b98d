//! Selective reverse-proxy relay.
//!
//! # Data Flow
//! ```text
//! <mount>/static/*path
//!     → static_asset.rs (transparent: all headers, body, status back)
//!     → asset origin
//!
//! <mount>/*path
//!     → target.rs (static/ prefix? asset origin : event origin)
//!     → headers.rs (allowlist, body only for POST/PUT/PATCH)
//!     → event.rs (upstream call, query reattached verbatim)
//!     → http/response.rs (mirror content-type only)
//! ```
//!
//! # Design Decisions
//! - Stateless per request; the context is read-only and swapped on reload
//! - No retries, caching, or payload transformation
//! - Non-2xx upstream statuses are relayed, network failures become 502

pub mod context;
pub mod error;
pub mod event;
pub mod headers;
pub mod static_asset;
pub mod target;

use axum::http::Uri;

pub use context::RelayContext;
pub use error::RelayError;
pub use event::relay_event;
pub use static_asset::relay_static;
pub use target::{Upstream, Upstreams};

/// The raw path below the mount point, without its leading slash.
///
/// Handlers run inside a nested router, so the URI they see already has
/// the mount prefix removed.
pub fn path_suffix(uri: &Uri) -> &str {
    let path = uri.path();
    path.strip_prefix('/').unwrap_or(path)
}
