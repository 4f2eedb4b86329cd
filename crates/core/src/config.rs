//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
///
/// `hostname` and `port` serve double duty: they are the bind address and
/// the address clients are told to fetch rewritten tarball URLs from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname to bind and to advertise in rewritten tarball URLs.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Port to bind and to advertise in rewritten tarball URLs.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Canonical URL under which this server exposes an attachment.
    pub fn attachment_url(&self, package: &str, filename: &str) -> String {
        format!(
            "http://{}:{}/{}/-/{}",
            self.hostname, self.port, package, filename
        )
    }
}

/// Local artifact store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per package.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

/// Package metadata registry configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to the JSON registry document.
    #[serde(default = "default_registry_file")]
    pub path: PathBuf,
}

/// Upstream forwarder configuration, consumed by the downloader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Upstream registry base URL.
    #[serde(default = "default_upstream_registry")]
    pub registry: String,
    /// Optional intermediate HTTP proxy for upstream fetches.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Whether cache misses are fetched from their origin URL.
    /// When false, a miss is reported as not found instead.
    #[serde(default = "default_auto_forward")]
    pub auto_forward: bool,
    /// User agent sent on upstream fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Total fetch timeout in seconds (0 disables).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds (0 disables).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum artifact size in bytes accepted from upstream (0 disables).
    #[serde(default)]
    pub max_artifact_bytes: u64,
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Artifact store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Upstream forwarder configuration.
    #[serde(default)]
    pub forwarder: ForwarderConfig,
}

impl AppConfig {
    /// Create a test configuration rooted at the given directories.
    ///
    /// **For testing only.** Uses the default hostname/port so rewritten
    /// URLs are deterministic.
    pub fn for_testing(storage_path: PathBuf, registry_path: PathBuf) -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig { path: storage_path },
            registry: RegistryConfig {
                path: registry_path,
            },
            forwarder: ForwarderConfig::default(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5984
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("registry")
}

fn default_registry_file() -> PathBuf {
    PathBuf::from("registry/registry.json")
}

fn default_upstream_registry() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_auto_forward() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("pantry/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_file(),
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            registry: default_upstream_registry(),
            proxy: None,
            auto_forward: default_auto_forward(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_artifact_bytes: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            registry: RegistryConfig::default(),
            forwarder: ForwarderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_url_uses_advertised_host_and_port() {
        let server = ServerConfig::default();
        assert_eq!(
            server.attachment_url("foo", "foo-1.0.0.tgz"),
            "http://localhost:5984/foo/-/foo-1.0.0.tgz"
        );
    }

    #[test]
    fn forwarder_defaults_point_at_npm() {
        let fwd = ForwarderConfig::default();
        assert_eq!(fwd.registry, "https://registry.npmjs.org");
        assert!(fwd.auto_forward);
        assert!(fwd.proxy.is_none());
        assert!(fwd.user_agent.starts_with("pantry/"));
    }
}
