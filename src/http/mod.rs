//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route dispatch)
//!     → request.rs (request ID assigned and echoed)
//!     → relay (static or event)
//!     → response.rs (transparent or content-type-only response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{GeneratedRequestId, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
