//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn an upstream response into the caller's response
//! - Transparent mode: status and headers kept, hop-by-hop headers stripped
//! - Filtered mode: status kept, only `content-type` mirrored
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - Upstream status codes are relayed verbatim, including 4xx/5xx

use axum::body::Body;
use axum::http::{header, HeaderMap};
use axum::response::Response;

use crate::relay::headers::strip_hop_by_hop;

/// Relay an upstream response untouched.
pub fn passthrough(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = strip_hop_by_hop(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Relay an upstream response keeping only its `content-type`.
pub fn mirror_content_type(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::new();
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
