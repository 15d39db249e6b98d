//! Filtered relay for event ingestion traffic.

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;

use crate::http::response::mirror_content_type;
use crate::relay::context::RelayContext;
use crate::relay::error::RelayError;
use crate::relay::headers::{filter_allowlisted, is_body_bearing};
use crate::relay::path_suffix;
use crate::relay::target::Upstream;

/// Forward a request below the mount point to the event origin.
///
/// Suffixes under `static/` resolve to the asset origin through the same
/// target function as the dedicated static route. Only allowlisted headers
/// go upstream, the body only for body-bearing methods, and only
/// `content-type` comes back.
pub async fn relay_event(
    ctx: &RelayContext,
    request: Request<Body>,
) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();
    let suffix = path_suffix(&parts.uri);
    let upstream = Upstream::for_suffix(suffix);
    let target = ctx
        .upstreams
        .target_url(upstream, suffix, parts.uri.query())?;

    let forwards_body = is_body_bearing(&parts.method);
    let headers = filter_allowlisted(&parts.headers, forwards_body);

    tracing::debug!(
        method = %parts.method,
        upstream = %upstream,
        target = %target,
        forwarded_headers = headers.len(),
        "Relaying event request"
    );

    let mut upstream_req = ctx
        .event_client
        .request(parts.method, target)
        .headers(headers);
    if forwards_body {
        let body = to_bytes(body, ctx.max_body_size)
            .await
            .map_err(RelayError::Body)?;
        upstream_req = upstream_req.body(body);
    }

    let response = upstream_req
        .send()
        .await
        .map_err(|source| RelayError::UpstreamUnreachable { upstream, source })?;

    Ok(mirror_content_type(response))
}
