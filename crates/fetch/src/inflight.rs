//! In-flight download registry.
//!
//! Two concurrent download requests for the same uncached artifact would
//! both observe a miss and race each other writing the same destination.
//! Requests instead acquire a per-`(package, filename)` lock before
//! fetching; the loser of the race re-checks the cache once it holds the
//! lock and finds the artifact already present.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (String, String);

/// Registry of in-flight downloads keyed by `(package, filename)`.
#[derive(Default)]
pub struct InflightDownloads {
    inner: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl InflightDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the download lock for an artifact, waiting for any fetch
    /// already in flight for the same key.
    pub async fn acquire(self: &Arc<Self>, package: &str, filename: &str) -> InflightGuard {
        let key = (package.to_string(), filename.to_string());
        let entry = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            map.entry(key.clone()).or_default().clone()
        };
        let permit = entry.lock_owned().await;
        InflightGuard {
            registry: Arc::clone(self),
            key,
            _permit: permit,
        }
    }

    /// Number of artifacts with a download currently registered.
    pub fn in_flight(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Holds the per-artifact download lock; dropping it releases the lock
/// and removes the registry entry once no other request is waiting.
pub struct InflightGuard {
    registry: Arc<InflightDownloads>,
    key: Key,
    _permit: OwnedMutexGuard<()>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut map = self
            .registry
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = map.get(&self.key) {
            // Two strong refs mean the map's and the one inside our
            // still-held permit; anything more is a waiting request.
            if Arc::strong_count(entry) <= 2 {
                map.remove(&self.key);
            }
        }
    }
}
