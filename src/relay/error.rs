//! Relay error taxonomy.
//!
//! Upstream non-2xx statuses are not errors here: they are relayed as-is.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::relay::target::Upstream;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The origin could not be reached or the exchange broke mid-flight.
    #[error("{upstream} origin unreachable: {source}")]
    UpstreamUnreachable {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid upstream target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target '{0}' resolves outside its origin")]
    ForeignTarget(String),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("invalid origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            RelayError::InvalidTarget { .. } | RelayError::ForeignTarget(_) | RelayError::Body(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::InvalidOrigin { .. } | RelayError::Client(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            RelayError::UpstreamUnreachable { .. } => "Upstream request failed",
            RelayError::InvalidTarget { .. } | RelayError::ForeignTarget(_) => "Invalid relay path",
            RelayError::Body(_) => "Failed to read request body",
            RelayError::InvalidOrigin { .. } | RelayError::Client(_) => "Relay misconfigured",
        };
        (status, message).into_response()
    }
}
