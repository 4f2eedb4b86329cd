//! Registry store trait and implementations.

use crate::error::RegistryResult;
use async_trait::async_trait;
use pantry_core::PackageMeta;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name-keyed package metadata store.
///
/// Stores own the package lifecycle; callers read a document, mutate it in
/// place, and hand it back via `set_package`. Persistence is synchronous
/// from the caller's perspective and last-writer-wins under concurrent
/// mutation of the same package.
#[async_trait]
pub trait RegistryStore: Send + Sync + 'static {
    /// Load a package document by name.
    async fn get_package(&self, name: &str) -> RegistryResult<Option<PackageMeta>>;

    /// Persist a package document under its own name.
    async fn set_package(&self, meta: &PackageMeta) -> RegistryResult<()>;

    /// List all package names.
    async fn list_packages(&self) -> RegistryResult<Vec<String>>;
}

/// JSON-file backed registry store.
///
/// The whole registry is one JSON object mapping package name to package
/// document. The document is held in memory and written through to disk
/// on every mutation via a temp file plus atomic rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    packages: RwLock<HashMap<String, PackageMeta>>,
}

impl JsonFileStore {
    /// Open a registry file, creating parent directories as needed.
    /// A missing file is an empty registry, not an error.
    pub async fn open(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let packages = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "registry file not found, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            packages = packages.len(),
            "registry loaded"
        );
        Ok(Self {
            path,
            packages: RwLock::new(packages),
        })
    }

    /// Write the full registry document to disk atomically.
    async fn persist(&self, packages: &HashMap<String, PackageMeta>) -> RegistryResult<()> {
        let data = serde_json::to_vec_pretty(packages)?;
        let temp_path = self.path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        tokio::fs::write(&temp_path, &data).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for JsonFileStore {
    async fn get_package(&self, name: &str) -> RegistryResult<Option<PackageMeta>> {
        Ok(self.packages.read().await.get(name).cloned())
    }

    async fn set_package(&self, meta: &PackageMeta) -> RegistryResult<()> {
        // Persist while holding the write lock so the on-disk document
        // never lags a later in-memory state.
        let mut packages = self.packages.write().await;
        packages.insert(meta.name.clone(), meta.clone());
        self.persist(&packages).await
    }

    async fn list_packages(&self) -> RegistryResult<Vec<String>> {
        let mut names: Vec<String> = self.packages.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// In-memory registry store, used by tests.
#[derive(Default)]
pub struct MemoryStore {
    packages: RwLock<HashMap<String, PackageMeta>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn get_package(&self, name: &str) -> RegistryResult<Option<PackageMeta>> {
        Ok(self.packages.read().await.get(name).cloned())
    }

    async fn set_package(&self, meta: &PackageMeta) -> RegistryResult<()> {
        self.packages
            .write()
            .await
            .insert(meta.name.clone(), meta.clone());
        Ok(())
    }

    async fn list_packages(&self) -> RegistryResult<Vec<String>> {
        let mut names: Vec<String> = self.packages.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::package::VersionManifest;

    fn sample_package() -> PackageMeta {
        let mut meta = PackageMeta::new("foo");
        meta.versions.insert(
            "1.0.0".to_string(),
            VersionManifest::with_tarball("https://upstream.example/foo/-/foo-1.0.0.tgz"),
        );
        meta
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("registry.json"))
            .await
            .unwrap();
        assert!(store.get_package("foo").await.unwrap().is_none());
        assert!(store.list_packages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_package_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.set_package(&sample_package()).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let meta = reopened.get_package("foo").await.unwrap().unwrap();
        assert_eq!(meta.name, "foo");
        assert!(meta.versions.contains_key("1.0.0"));
        assert_eq!(reopened.list_packages().await.unwrap(), vec!["foo"]);
    }

    #[tokio::test]
    async fn set_package_overwrites_previous_document() {
        let store = MemoryStore::new();
        store.set_package(&sample_package()).await.unwrap();

        let mut updated = sample_package();
        updated.versions.remove("1.0.0");
        store.set_package(&updated).await.unwrap();

        let meta = store.get_package("foo").await.unwrap().unwrap();
        assert!(meta.versions.is_empty());
    }

    #[tokio::test]
    async fn malformed_registry_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, crate::error::RegistryError::Malformed(_)));
    }
}
