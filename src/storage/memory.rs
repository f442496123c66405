//! In-memory storage backend for tests and local development.
//!
//! Objects live in a `BTreeMap` behind an `RwLock`, so listings come back in
//! key order without external dependencies. Signed URLs are deterministic
//! fakes that embed the TTL and disposition, which lets tests assert the
//! delivery service's URL policy without a real bucket.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObjectBody, ObjectInfo, ObjectStore, StoreError, StoreResult};

pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    signing: SigningMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SigningMode {
    Signs,
    /// No credential: `can_sign` is false, URLs fall back to the public form.
    Unavailable,
    /// Credential present but every signing attempt errors.
    Fails,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            signing: SigningMode::Signs,
        }
    }

    pub fn without_signing() -> Self {
        Self {
            signing: SigningMode::Unavailable,
            ..Self::new()
        }
    }

    pub fn with_failing_signer() -> Self {
        Self {
            signing: SigningMode::Fails,
            ..Self::new()
        }
    }

    pub async fn put(&self, key: &str, data: impl Into<Bytes>, content_type: &str) {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
                created_at: Utc::now(),
            },
        );
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn get_bytes(&self, key: &str) -> StoreResult<ObjectBody> {
        let objects = self.objects.read().await;
        let object = objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(ObjectBody {
            bytes: object.data.clone(),
            content_type: Some(object.content_type.clone()),
        })
    }

    async fn size(&self, key: &str) -> StoreResult<u64> {
        let objects = self.objects.read().await;
        let object = objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(object.data.len() as u64)
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: Some(object.created_at),
            })
            .collect())
    }

    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String> {
        if self.signing == SigningMode::Fails {
            return Err(StoreError::request("sign", key, "signer unavailable"));
        }
        let mut url = format!(
            "https://store.invalid/{}?X-Amz-Expires={}",
            key,
            ttl.as_secs()
        );
        if let Some(disposition) = disposition {
            url.push_str("&response-content-disposition=");
            url.push_str(disposition);
        }
        Ok(url)
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://public.store.invalid/{}", key)
    }

    fn can_sign(&self) -> bool {
        self.signing != SigningMode::Unavailable
    }

    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StoreResult<()> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| StoreError::request("put", key, err))?;
        self.put(key, data, content_type).await;
        Ok(())
    }
}
