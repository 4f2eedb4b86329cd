//! Core domain types and shared logic for the Pantry registry proxy.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Package metadata documents (versions, dist tarballs, attachment records)
//! - Attachment filename validation
//! - The metadata synchronizer that rewrites tarball URLs to this host
//! - Configuration types for the server, store, and upstream forwarder

pub mod config;
pub mod error;
pub mod filename;
pub mod package;
pub mod sync;

pub use config::{AppConfig, ForwarderConfig, RegistryConfig, ServerConfig, StorageConfig};
pub use error::{Error, Result};
pub use package::{AttachmentRecord, DistInfo, PackageMeta, VersionManifest};
