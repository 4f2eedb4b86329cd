//! Package metadata document model.
//!
//! Mirrors the registry document format: a package has a `versions` map of
//! manifests and a derived `_attachments` map tracking, per tarball
//! filename, whether the file is cached locally and where its origin is.
//! Manifest fields this system does not interpret are round-tripped
//! untouched via flattened maps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attachment record, rebuilt on every synchronization pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Snapshot of "file exists in the local store" at the last
    /// synchronization pass.
    pub cached: bool,
    /// Original origin URL this artifact can be fetched from on a miss.
    #[serde(rename = "forwardUrl")]
    pub forward_url: String,
}

/// Tarball location within a version manifest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistInfo {
    /// Tarball URL. Rewritten by the synchronizer to point at this server.
    #[serde(default)]
    pub tarball: String,
    /// Fields such as shasum are passed through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One published version of a package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionManifest {
    /// Dist section; absent on malformed manifests, which the
    /// synchronizer skips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<DistInfo>,
    /// Remaining manifest fields, opaque to this system.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VersionManifest {
    /// Build a manifest with just a tarball URL (test and seed helper).
    pub fn with_tarball(url: impl Into<String>) -> Self {
        Self {
            dist: Some(DistInfo {
                tarball: url.into(),
                extra: serde_json::Map::new(),
            }),
            extra: serde_json::Map::new(),
        }
    }
}

/// Package metadata document, one per package name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMeta {
    /// Package name, immutable after creation.
    pub name: String,
    /// Version string to manifest.
    #[serde(default)]
    pub versions: HashMap<String, VersionManifest>,
    /// Derived attachment records; owned by the synchronizer.
    #[serde(rename = "_attachments", default)]
    pub attachments: HashMap<String, AttachmentRecord>,
    /// Document fields this system does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageMeta {
    /// Create an empty package document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
