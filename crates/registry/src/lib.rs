//! Package metadata store for the Pantry registry proxy.
//!
//! The control-plane data model is a single name-keyed mapping of package
//! metadata documents. Stores load and persist whole documents; all field
//! mutation (URL rewriting, attachment records) happens in `pantry-core`.

pub mod error;
pub mod store;

pub use error::{RegistryError, RegistryResult};
pub use store::{JsonFileStore, MemoryStore, RegistryStore};

use pantry_core::config::RegistryConfig;
use std::sync::Arc;

/// Create a registry store from configuration.
pub async fn from_config(config: &RegistryConfig) -> RegistryResult<Arc<dyn RegistryStore>> {
    let store = JsonFileStore::open(&config.path).await?;
    Ok(Arc::new(store) as Arc<dyn RegistryStore>)
}
