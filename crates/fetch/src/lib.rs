//! Fetch-through downloader for the Pantry registry proxy.
//!
//! On a cache miss the server fetches the artifact from its recorded
//! origin URL, optionally through a configured forwarding proxy, and
//! streams it to the local store. Bodies land in a temp file that is
//! renamed into place only once fully written, so a visible artifact is
//! always complete. An in-flight registry serializes concurrent misses
//! for the same artifact.

pub mod error;
pub mod fetcher;
pub mod inflight;

pub use error::{FetchError, FetchResult};
pub use fetcher::Fetcher;
pub use inflight::{InflightDownloads, InflightGuard};
