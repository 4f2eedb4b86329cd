//! Registry store error types.

use thiserror::Error;

/// Registry store operation errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
