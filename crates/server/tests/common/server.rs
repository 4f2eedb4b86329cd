//! Server test utilities.

use pantry_core::config::AppConfig;
use pantry_core::package::PackageMeta;
use pantry_fetch::Fetcher;
use pantry_registry::{JsonFileStore, RegistryStore};
use pantry_server::{AppState, create_router};
use pantry_storage::PackageStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies on temp storage.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage_path = temp_dir.path().join("packages");
        let registry_path = temp_dir.path().join("registry.json");

        let mut config = AppConfig::for_testing(storage_path.clone(), registry_path.clone());
        modifier(&mut config);

        let store = Arc::new(
            PackageStore::new(&storage_path)
                .await
                .expect("Failed to create artifact store"),
        );
        let registry: Arc<dyn RegistryStore> = Arc::new(
            JsonFileStore::open(&registry_path)
                .await
                .expect("Failed to open registry store"),
        );
        let fetcher = Fetcher::new(&config.forwarder).expect("Failed to build fetcher");

        let state = AppState::new(config, store, registry, fetcher);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Persist a package document directly into the registry.
    pub async fn seed_package(&self, meta: &PackageMeta) {
        self.state
            .registry
            .set_package(meta)
            .await
            .expect("Failed to seed package");
    }

    /// Read a package document back from the registry.
    pub async fn package(&self, name: &str) -> Option<PackageMeta> {
        self.state
            .registry
            .get_package(name)
            .await
            .expect("Failed to read package")
    }

    /// Write an artifact file directly into the store.
    pub async fn write_artifact(&self, package: &str, filename: &str, data: &[u8]) {
        use bytes::Bytes;
        let mut upload = self
            .state
            .store
            .put_stream(package, filename)
            .await
            .expect("Failed to open upload");
        upload
            .write(Bytes::copy_from_slice(data))
            .await
            .expect("Failed to write artifact");
        upload.finish().await.expect("Failed to finish artifact");
    }

    /// On-disk path of an artifact (whether or not it exists).
    pub fn artifact_path(&self, package: &str, filename: &str) -> PathBuf {
        self.state.store.root().join(package).join(filename)
    }
}
