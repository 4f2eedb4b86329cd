//! Upstream artifact fetcher.

use crate::error::{FetchError, FetchResult};
use futures::StreamExt;
use pantry_core::config::ForwarderConfig;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

/// Artifacts written by the fetcher are owner/group read-write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o660;

/// HTTP client wrapper for fetch-through downloads.
///
/// One reqwest client is built per process from the forwarder
/// configuration: user agent, total/connect timeouts, and the optional
/// forwarding proxy. Routing the request through the proxy (effective
/// target, Host header) is handled by `reqwest::Proxy`.
pub struct Fetcher {
    client: Client,
    max_artifact_bytes: u64,
}

impl Fetcher {
    /// Build a fetcher from forwarder configuration.
    pub fn new(config: &ForwarderConfig) -> FetchResult<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
            tracing::info!(proxy_url = %proxy_url, "using forwarding proxy for upstream fetches");
        } else {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            max_artifact_bytes: config.max_artifact_bytes,
        })
    }

    /// Fetch `origin_url` and write the body to `dest`.
    ///
    /// The body streams into a `.tmp.<uuid>` sibling of `dest`, which is
    /// fsynced and renamed onto `dest` only after the response is fully
    /// consumed. On any failure the temp file is removed and `dest` is
    /// left untouched. Returns the number of bytes written.
    #[instrument(skip(self), fields(url = %origin_url))]
    pub async fn fetch(&self, origin_url: &str, dest: &Path) -> FetchResult<u64> {
        Url::parse(origin_url).map_err(|source| FetchError::InvalidUrl {
            url: origin_url.to_string(),
            source,
        })?;

        tracing::info!("downloading tarball");
        let response = self.client.get(origin_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: origin_url.to_string(),
            });
        }

        if self.max_artifact_bytes > 0
            && let Some(len) = response.content_length()
            && len > self.max_artifact_bytes
        {
            return Err(FetchError::TooLarge {
                url: origin_url.to_string(),
                limit: self.max_artifact_bytes,
            });
        }

        let temp_path = temp_sibling(dest);
        let result = self
            .stream_to_file(origin_url, response, &temp_path)
            .await;

        match result {
            Ok(written) => {
                fs::rename(&temp_path, dest).await?;
                tracing::info!(bytes = written, dest = %dest.display(), "tarball cached");
                Ok(written)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    /// Stream a response body into a file, enforcing the size cap.
    async fn stream_to_file(
        &self,
        origin_url: &str,
        response: reqwest::Response,
        path: &Path,
    ) -> FetchResult<u64> {
        let mut file = fs::File::create(path).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE)).await?;
        }

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            if self.max_artifact_bytes > 0 && written > self.max_artifact_bytes {
                return Err(FetchError::TooLarge {
                    url: origin_url.to_string(),
                    limit: self.max_artifact_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

/// Unique temp path next to the destination, on the same filesystem so
/// the final rename is atomic.
fn temp_sibling(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!("{file_name}.tmp.{}", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use pantry_core::config::ForwarderConfig;

    fn test_fetcher(max_artifact_bytes: u64) -> Fetcher {
        Fetcher::new(&ForwarderConfig {
            max_artifact_bytes,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_writes_body_to_destination() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/foo/-/foo-1.0.0.tgz");
                then.status(200).body(b"tarball bytes");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("foo-1.0.0.tgz");
        let written = test_fetcher(0)
            .fetch(&server.url("/foo/-/foo-1.0.0.tgz"), &dest)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"tarball bytes");
    }

    #[tokio::test]
    async fn non_success_status_leaves_no_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.tgz");
                then.status(404);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.tgz");
        let err = test_fetcher(0)
            .fetch(&server.url("/gone.tgz"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn size_cap_is_enforced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/big.tgz");
                then.status(200).body(vec![0u8; 1024]);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("big.tgz");
        let err = test_fetcher(16)
            .fetch(&server.url("/big.tgz"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::TooLarge { limit: 16, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.tgz");
        let err = test_fetcher(0)
            .fetch("not a url", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(!dest.exists());
    }
}
