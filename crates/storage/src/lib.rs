//! Local artifact store for the Pantry registry proxy.
//!
//! Artifacts live under one directory per package name beneath a
//! configurable store root; each artifact is a single file named exactly
//! as its attachment filename. Writes go through a temp-file plus atomic
//! rename so that a file's existence always implies completeness.

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{ByteStream, PackageStore, StreamingUpload};
