//! Application state shared across handlers.

use pantry_core::config::AppConfig;
use pantry_fetch::{Fetcher, InflightDownloads};
use pantry_registry::RegistryStore;
use pantry_storage::PackageStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Local artifact store.
    pub store: Arc<PackageStore>,
    /// Package metadata registry.
    pub registry: Arc<dyn RegistryStore>,
    /// Upstream fetcher.
    pub fetcher: Arc<Fetcher>,
    /// In-flight download registry (one fetch per artifact at a time).
    pub inflight: Arc<InflightDownloads>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        store: Arc<PackageStore>,
        registry: Arc<dyn RegistryStore>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            registry,
            fetcher: Arc::new(fetcher),
            inflight: Arc::new(InflightDownloads::new()),
        }
    }
}
