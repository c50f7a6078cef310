//! Object storage for generated images
//!
//! Images are written under deterministic keys
//! (`<prefix>images/blogs/<run-id>/<index>.<ext>`), so uploading the same
//! bytes to the same key twice leaves the store unchanged and yields the
//! same URL.

mod fs;
mod s3;

pub use fs::FsObjectStore;
pub use s3::S3ObjectStore;

use crate::images::ImageFormat;
use crate::types::{Rendition, RunId};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Trait for object stores that publish uploaded bytes at a public URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key` and return the public URL
    ///
    /// Must be idempotent per key: same key and same bytes give the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upload`](crate::Error::Upload) if the write fails.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> crate::Result<String>;

    /// Public URL an object under `key` is served at
    fn public_url(&self, key: &str) -> String;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Build the object key for an image of a run
///
/// An empty prefix yields `images/blogs/<run-id>/<index>.<ext>`; a non-empty
/// prefix is joined with exactly one `/`.
pub fn object_key(prefix: &str, run_id: &RunId, index: u32, format: ImageFormat) -> String {
    prefixed(
        prefix,
        format!("images/blogs/{run_id}/{index}.{}", format.extension()),
    )
}

/// Build the object key for a PNG rendition of an image
///
/// Renditions sit next to their source: `images/blogs/<run-id>/<index>-<rendition>.png`.
pub fn rendition_key(prefix: &str, run_id: &RunId, index: u32, rendition: Rendition) -> String {
    prefixed(prefix, format!("images/blogs/{run_id}/{index}-{rendition}.png"))
}

fn prefixed(prefix: &str, key: String) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        key
    } else {
        format!("{prefix}/{key}")
    }
}

/// Hex-encoded SHA-256 digest of `bytes`
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Join a base URL and an object key with a single `/`
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
