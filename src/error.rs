use std::time::Duration;

use thiserror::Error;

/// Failure of a single outbound call to an upstream provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream returned {status} {reason}")]
    UpstreamStatus { status: u16, reason: String },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ClientOptionsError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("base url missing host")]
    MissingHost,

    #[error("base url missing port")]
    MissingPort,

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
