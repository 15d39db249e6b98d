//! Transparent relay for the SDK's static assets.

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;

use crate::http::request::{GeneratedRequestId, X_REQUEST_ID};
use crate::http::response::passthrough;
use crate::relay::context::RelayContext;
use crate::relay::error::RelayError;
use crate::relay::headers::strip_for_passthrough;
use crate::relay::path_suffix;
use crate::relay::target::Upstream;

/// Forward `<mount>/static/<p>` to `<asset-origin>/static/<p>` unchanged.
///
/// Method, headers (minus `host` and hop-by-hop), body and query string go
/// upstream as received; status, headers and body come back the same way.
/// A request ID the relay generated stays local.
pub async fn relay_static(
    ctx: &RelayContext,
    request: Request<Body>,
) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();
    let suffix = path_suffix(&parts.uri);
    let target = ctx
        .upstreams
        .target_url(Upstream::Asset, suffix, parts.uri.query())?;

    tracing::debug!(method = %parts.method, target = %target, "Relaying static asset");

    let body = to_bytes(body, ctx.max_body_size)
        .await
        .map_err(RelayError::Body)?;

    let mut headers = strip_for_passthrough(&parts.headers);
    if parts.extensions.get::<GeneratedRequestId>().is_some() {
        headers.remove(X_REQUEST_ID);
    }

    let mut upstream_req = ctx
        .asset_client
        .request(parts.method, target)
        .headers(headers);
    if !body.is_empty() {
        upstream_req = upstream_req.body(body);
    }

    let upstream = upstream_req
        .send()
        .await
        .map_err(|source| RelayError::UpstreamUnreachable {
            upstream: Upstream::Asset,
            source,
        })?;

    Ok(passthrough(upstream))
}
