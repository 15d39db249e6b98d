//! Header policies for the two relays.
//!
//! # Responsibilities
//! - Reduce event-relay requests to the forwarding allowlist
//! - Strip connection-level headers on the transparent static relay
//! - Decide which methods carry a body upstream
//! - Narrow `accept-encoding` to codings the event client can decode
//!
//! # Design Decisions
//! - Allowlist, not blocklist: anything unknown (cookies, auth, tracing
//!   IDs, client IPs) is dropped for event traffic
//! - `host` is never forwarded; the upstream URL determines it

use axum::http::{header, HeaderMap, HeaderValue, Method};

/// Headers the event relay may pass upstream.
pub const FORWARD_ALLOWLIST: &[&str] = &[
    "content-type",
    "content-length",
    "accept",
    "accept-encoding",
    "user-agent",
    "origin",
];

/// Content codings the event client decodes before mirroring a response.
///
/// Must track the compression features enabled on `reqwest`.
const DECODABLE_CODINGS: &[&str] = &["gzip", "br", "deflate", "zstd", "identity"];

/// Connection-scoped headers that must not cross a proxy hop.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_allowlisted(name: &str) -> bool {
    FORWARD_ALLOWLIST
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Methods whose body is read and forwarded by the event relay.
pub fn is_body_bearing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Copy only allowlisted headers.
///
/// `content-length` is dropped when no body will be sent, otherwise the
/// upstream would wait for bytes that never arrive. `accept-encoding` keeps
/// only decodable codings: the response goes back without its
/// `content-encoding`, so anything else would reach the caller undecodable.
pub fn filter_allowlisted(inbound: &HeaderMap, forwards_body: bool) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for (name, value) in inbound {
        if !is_allowlisted(name.as_str()) || *name == header::ACCEPT_ENCODING {
            continue;
        }
        if !forwards_body && *name == header::CONTENT_LENGTH {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    if let Some(value) = decodable_accept_encoding(inbound) {
        outbound.insert(header::ACCEPT_ENCODING, value);
    }
    outbound
}

/// The caller's `accept-encoding` entries whose coding the event client
/// decodes, joined into one value. `None` when nothing survives.
fn decodable_accept_encoding(inbound: &HeaderMap) -> Option<HeaderValue> {
    let entries: Vec<&str> = inbound
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|entry| {
            let coding = entry.split(';').next().unwrap_or_default().trim();
            DECODABLE_CODINGS
                .iter()
                .any(|c| coding.eq_ignore_ascii_case(c))
        })
        .collect();

    if entries.is_empty() {
        return None;
    }
    HeaderValue::from_str(&entries.join(", ")).ok()
}

/// Copy every header except hop-by-hop ones and `host`.
pub fn strip_for_passthrough(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for (name, value) in inbound {
        if *name == header::HOST || is_hop_by_hop(name.as_str()) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound
}

/// Response headers forwarded by the transparent relay.
pub fn strip_hop_by_hop(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if !is_hop_by_hop(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
