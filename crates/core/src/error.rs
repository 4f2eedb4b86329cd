//! Core error types.

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid attachment filename: {0}")]
    InvalidFilename(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
