//! Object store abstraction.
//!
//! The gallery treats the bucket as an opaque key/blob store. Everything the
//! request path needs is behind the [`ObjectStore`] trait so the services can
//! be tested against [`memory::InMemoryObjectStore`] while production runs
//! against [`s3::S3ObjectStore`].

pub mod memory;
pub mod s3;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("{op} failed for `{key}`: {reason}")]
    Request {
        op: &'static str,
        key: String,
        reason: String,
    },
}

impl StoreError {
    pub fn request(op: &'static str, key: &str, reason: impl ToString) -> Self {
        StoreError::Request {
            op,
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A fully downloaded object.
#[derive(Debug, Clone)]
pub struct ObjectBody {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// One entry from a prefix listing.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Backend-agnostic view of the bucket.
///
/// All operations are per-key and stateless; implementations must be safe to
/// share across request handlers behind an `Arc`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists under `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Download an object in full.
    async fn get_bytes(&self, key: &str) -> StoreResult<ObjectBody>;

    /// Size of an object in bytes.
    async fn size(&self, key: &str) -> StoreResult<u64>;

    /// List every key under `prefix`, exhausting pagination.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>>;

    /// Issue a time-limited GET URL, optionally overriding the
    /// `Content-Disposition` the store will attach to the response.
    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String>;

    /// Unauthenticated bucket URL for `key`. Only useful when the bucket is
    /// publicly readable.
    fn public_url(&self, key: &str) -> String;

    /// Whether a signing credential is available to this store.
    fn can_sign(&self) -> bool;

    /// Upload a local file. Used by the offline transcoder only.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StoreResult<()>;
}

/// Construct the production store from configuration.
///
/// Credential selection happens exactly once, here, at bootstrap.
pub async fn connect(cfg: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let store = s3::S3ObjectStore::connect(cfg).await?;
    Ok(Arc::new(store))
}

/// Content type for a key, by extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".mp4") {
        "video/mp4"
    } else if lower.ends_with(".ico") {
        "image/x-icon"
    } else if lower.ends_with(".webmanifest") {
        "application/manifest+json"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_covers_served_assets() {
        assert_eq!(content_type_for_key("a/b/photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for_key("clip.mp4"), "video/mp4");
        assert_eq!(content_type_for_key("favicon_io/favicon.ico"), "image/x-icon");
        assert_eq!(
            content_type_for_key("favicon_io/site.webmanifest"),
            "application/manifest+json"
        );
        assert_eq!(content_type_for_key("unknown.bin"), "application/octet-stream");
    }
}
