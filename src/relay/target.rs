//! Upstream selection and target URL construction.
//!
//! Both relays resolve URLs through [`Upstreams::target_url`], so the
//! dedicated static route and the event relay's `static/` branch can never
//! disagree about where an asset lives.

use url::Url;

use crate::config::RelaySettings;
use crate::relay::error::RelayError;

/// Path prefix (below the mount point) served by the asset origin.
pub const STATIC_PREFIX: &str = "static/";

/// Which fixed origin a request is forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Asset,
    Event,
}

impl Upstream {
    /// Select the origin for a path suffix captured below the mount point.
    pub fn for_suffix(suffix: &str) -> Self {
        if suffix.starts_with(STATIC_PREFIX) {
            Upstream::Asset
        } else {
            Upstream::Event
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Upstream::Asset => "asset",
            Upstream::Event => "event",
        }
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two parsed upstream origins.
#[derive(Debug, Clone)]
pub struct Upstreams {
    asset: Url,
    event: Url,
}

impl Upstreams {
    pub fn new(asset_origin: &str, event_origin: &str) -> Result<Self, RelayError> {
        Ok(Self {
            asset: parse_origin(asset_origin)?,
            event: parse_origin(event_origin)?,
        })
    }

    pub fn from_settings(settings: &RelaySettings) -> Result<Self, RelayError> {
        Self::new(&settings.asset_origin, &settings.event_origin)
    }

    pub fn origin(&self, upstream: Upstream) -> &Url {
        match upstream {
            Upstream::Asset => &self.asset,
            Upstream::Event => &self.event,
        }
    }

    /// Build `<origin>/<suffix>?<query>`.
    ///
    /// The suffix is the raw (still percent-encoded) path below the mount
    /// point and the query is reattached verbatim, keeping key order and
    /// repeated keys.
    pub fn target_url(
        &self,
        upstream: Upstream,
        suffix: &str,
        query: Option<&str>,
    ) -> Result<Url, RelayError> {
        let origin = self.origin(upstream);
        let joined = format!("{}/{}", origin.as_str().trim_end_matches('/'), suffix);

        let mut url = Url::parse(&joined).map_err(|source| RelayError::InvalidTarget {
            target: joined.clone(),
            source,
        })?;

        // The suffix is caller-controlled; it must never move us off the origin.
        if url.host_str() != origin.host_str() || url.port_or_known_default() != origin.port_or_known_default() {
            return Err(RelayError::ForeignTarget(joined));
        }

        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }
}

fn parse_origin(origin: &str) -> Result<Url, RelayError> {
    Url::parse(origin).map_err(|source| RelayError::InvalidOrigin {
        origin: origin.to_string(),
        source,
    })
}
