use http::{Method, StatusCode};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("no managed zone found for {fqdn}")]
    ZoneNotFound { fqdn: String },
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{method} {path} request failed: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} error: {detail}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        detail: String,
    },

    #[error("{method} {path} response parsing error: {source}")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// The HTTP status the provider answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
