//! Shared, immutable relay state.

use std::time::Duration;

use reqwest::{redirect, Client};

use crate::config::RelayConfig;
use crate::relay::error::RelayError;
use crate::relay::target::Upstreams;

/// Everything a relay handler needs. Rebuilt wholesale on config reload.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub upstreams: Upstreams,
    /// Client for event traffic. Decodes compressed bodies because only
    /// `content-type` is mirrored back to the caller.
    pub event_client: Client,
    /// Client for asset traffic. Never decodes and never follows redirects.
    pub asset_client: Client,
    pub max_body_size: usize,
}

impl RelayContext {
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let upstreams = Upstreams::from_settings(&config.relay)?;
        let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);

        let event_client = Client::builder()
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()
            .map_err(RelayError::Client)?;

        let asset_client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(redirect::Policy::none())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .no_proxy()
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            upstreams,
            event_client,
            asset_client,
            max_body_size: config.relay.max_body_size,
        })
    }
}
