//! Fetch error types.

use thiserror::Error;

/// Errors from upstream artifact fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid origin URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("artifact from {url} exceeds size limit of {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
