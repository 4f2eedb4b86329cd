//! Filesystem-backed package store.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Package directories are owner/group only.
#[cfg(unix)]
const DIR_MODE: u32 = 0o770;

/// Artifacts are owner/group read-write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o660;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Trait for streaming artifact writes.
///
/// Data lands in a temp file; only `finish` makes it visible under the
/// final name, so readers never observe a partially written artifact.
#[async_trait]
pub trait StreamingUpload: Send {
    /// Write a chunk of data.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Flush, fsync, and rename into place. Returns total bytes written.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Abort the upload, removing the temp file.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Local artifact store: one directory per package under a single root.
pub struct PackageStore {
    root: PathBuf,
}

impl PackageStore {
    /// Create a store rooted at `root`, creating the root if missing.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject anything that is not a single normal path component.
    /// Filename validation upstream should already have caught these;
    /// this is the storage-level second layer.
    fn validate_component(value: &str) -> StorageResult<()> {
        if value.is_empty()
            || value.contains('/')
            || value.contains('\\')
            || value == "."
            || value == ".."
        {
            return Err(StorageError::InvalidKey(format!(
                "not a single path component: {value}"
            )));
        }
        for component in Path::new(value).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve (and create on demand) the directory for a package.
    ///
    /// "Already exists" is success; any other creation failure propagates.
    #[instrument(skip(self))]
    pub async fn package_dir(&self, package: &str) -> StorageResult<PathBuf> {
        Self::validate_component(package)?;
        let dir = self.root.join(package);
        if !fs::try_exists(&dir).await? {
            fs::create_dir_all(&dir).await?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dir, std::fs::Permissions::from_mode(DIR_MODE)).await?;
            }
        }
        Ok(dir)
    }

    /// Deterministic on-disk path for an artifact: `<root>/<package>/<filename>`.
    /// Creates the package directory on demand.
    pub async fn artifact_path(&self, package: &str, filename: &str) -> StorageResult<PathBuf> {
        Self::validate_component(filename)?;
        let dir = self.package_dir(package).await?;
        Ok(dir.join(filename))
    }

    /// Check whether an artifact file exists.
    #[instrument(skip(self))]
    pub async fn exists(&self, package: &str, filename: &str) -> StorageResult<bool> {
        let path = self.artifact_path(package, filename).await?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    /// Get an artifact's size without reading it.
    #[instrument(skip(self))]
    pub async fn head(&self, package: &str, filename: &str) -> StorageResult<u64> {
        let path = self.artifact_path(package, filename).await?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("{package}/{filename}"))
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(meta.len())
    }

    /// Read an artifact as a chunked byte stream.
    #[instrument(skip(self))]
    pub async fn get_stream(&self, package: &str, filename: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.artifact_path(package, filename).await?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("{package}/{filename}"))
            } else {
                StorageError::Io(e)
            }
        })?;

        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    /// Start a streaming write of an artifact.
    ///
    /// Writes go to a `.tmp.<uuid>` sibling; `finish()` renames onto the
    /// final path, overwriting any existing file.
    #[instrument(skip(self))]
    pub async fn put_stream(
        &self,
        package: &str,
        filename: &str,
    ) -> StorageResult<Box<dyn StreamingUpload>> {
        let path = self.artifact_path(package, filename).await?;

        let temp_path = path.with_file_name(format!("{filename}.tmp.{}", Uuid::new_v4()));
        let file = fs::File::create(&temp_path).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(FILE_MODE)).await?;
        }

        Ok(Box::new(ArtifactUpload {
            file,
            temp_path,
            final_path: path,
            bytes_written: 0,
        }))
    }

    /// Delete an artifact file.
    #[instrument(skip(self))]
    pub async fn delete(&self, package: &str, filename: &str) -> StorageResult<()> {
        let path = self.artifact_path(package, filename).await?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("{package}/{filename}"))
            } else {
                StorageError::Io(e)
            }
        })
    }
}

/// In-progress artifact write.
struct ArtifactUpload {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

#[async_trait]
impl StreamingUpload for ArtifactUpload {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        fs::rename(&self.temp_path, &self.final_path).await?;
        Ok(self.bytes_written)
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        drop(self.file);
        let _ = fs::remove_file(&self.temp_path).await;
        Ok(())
    }
}
