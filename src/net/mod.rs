//! Network layer.
//!
//! Plain TCP listeners are bound directly in `main`; this module only
//! covers optional TLS termination for serving the relay on the
//! first-party domain without a fronting load balancer.

pub mod tls;

pub use tls::load_tls_config;
