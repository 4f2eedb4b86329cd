//! Metadata synchronizer.
//!
//! Recomputes a package's attachment records from its version manifests
//! and the current on-disk cache state, rewriting every `dist.tarball`
//! URL to point at this server. The rebuilt `_attachments` map fully
//! replaces the previous one, so records for removed versions are
//! dropped rather than accumulated.

use crate::config::ServerConfig;
use crate::filename;
use crate::package::{AttachmentRecord, PackageMeta};
use std::collections::HashMap;
use std::path::Path;

/// Refresh `meta` in place against the package directory `pkg_dir`.
///
/// The origin URL recorded for a filename is taken from the existing
/// attachment record when one is present; the manifest's tarball URL is
/// only trusted the first time around. Once a pass has rewritten
/// `dist.tarball` to the local address, re-deriving the origin from it
/// would silently replace the true upstream with ourselves.
///
/// Never fails: manifests without a tarball URL are skipped with a
/// warning. Never touches artifact files.
pub fn refresh(meta: &mut PackageMeta, pkg_dir: &Path, server: &ServerConfig) {
    let package = meta.name.clone();
    let mut attachments = HashMap::new();

    for (version, manifest) in &mut meta.versions {
        let Some(dist) = manifest.dist.as_mut() else {
            tracing::warn!(%package, %version, "manifest has no dist section, skipping");
            continue;
        };
        let Some(file) = filename::from_tarball_url(&dist.tarball) else {
            tracing::warn!(%package, %version, "manifest has no tarball URL, skipping");
            continue;
        };
        let file = file.to_string();

        // Capture the origin before rewriting the tarball URL.
        let forward_url = meta
            .attachments
            .get(&file)
            .map(|record| record.forward_url.clone())
            .unwrap_or_else(|| dist.tarball.clone());

        dist.tarball = server.attachment_url(&package, &file);

        let cached = pkg_dir.join(&file).is_file();
        attachments.insert(
            file,
            AttachmentRecord {
                cached,
                forward_url,
            },
        );
    }

    meta.attachments = attachments;
}
