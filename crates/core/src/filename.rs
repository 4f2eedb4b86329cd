//! Attachment filename validation.
//!
//! Filenames are the last path segment of a tarball URL and must map to a
//! single file inside a package directory. Rejecting separators here is the
//! primary defense against path traversal into the local store; the storage
//! crate applies its own component check as a second layer.

use crate::error::{Error, Result};

/// Check whether an attachment filename is safe to use as a single path
/// component. Rejects raw and percent-encoded slashes, backslashes, and
/// the dot directories.
pub fn is_valid(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    // Percent-encoded separators would decode to a slash downstream.
    let lowered = name.to_ascii_lowercase();
    if lowered.contains("%2f") || lowered.contains("%5c") {
        return false;
    }
    true
}

/// Validate an attachment filename, returning it on success.
pub fn validate(name: &str) -> Result<&str> {
    if is_valid(name) {
        Ok(name)
    } else {
        Err(Error::InvalidFilename(name.to_string()))
    }
}

/// Extract the attachment filename from a tarball URL (its final path
/// segment). Returns `None` for URLs without a usable segment.
pub fn from_tarball_url(url: &str) -> Option<&str> {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let segment = trimmed.rsplit('/').next().unwrap_or("");
    if segment.is_empty() { None } else { Some(segment) }
}
