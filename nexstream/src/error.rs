//! Error types for the stream service

use axum::http::StatusCode;
use std::time::Duration;

/// Result type alias for stream service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, searching or proxying a stream
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request parameter is missing or empty
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),

    /// A request parameter could not be parsed
    #[error("invalid {0} parameter")]
    InvalidParameter(&'static str),

    /// The extractor returned no usable audio-only URL
    #[error("no stream resolvable for {0}")]
    NoStreamResolvable(String),

    /// The extractor ran but reported a failure
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The extractor process could not be spawned or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The extractor output could not be parsed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request to the upstream failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned {0}")]
    UpstreamStatus(StatusCode),

    /// Upstream did not send a response head in time
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// HTTP status sent to the client for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::NoStreamResolvable(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Terse message sent to the client; the full detail stays in the logs
    pub fn client_message(&self) -> String {
        match self {
            Self::NoStreamResolvable(_) => "could not resolve stream".to_string(),
            other => other.to_string(),
        }
    }
}
