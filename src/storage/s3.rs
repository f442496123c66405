//! Production storage backend wrapping `aws-sdk-s3`.
//!
//! Works against AWS S3 and S3-compatible stores (MinIO, GCS interop mode,
//! DigitalOcean Spaces) via a configurable endpoint with path-style
//! addressing.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::DateTime;
use tracing::{debug, info};

use crate::config::AppConfig;

use super::{ObjectBody, ObjectInfo, ObjectStore, StoreError, StoreResult};

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
    signing_available: bool,
}

impl S3ObjectStore {
    /// Build the store client from configuration.
    ///
    /// Credential selection: explicit static keys produce a signing-capable
    /// client; without them the ambient default credential chain is used
    /// (managed-platform case) and every issued URL falls back to the public
    /// bucket form.
    pub async fn connect(cfg: &AppConfig) -> anyhow::Result<Self> {
        let (client, signing_available) = match static_credentials(cfg) {
            Some(credentials) => {
                let mut builder = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(cfg.region.clone()))
                    .credentials_provider(credentials);
                if let Some(endpoint) = &cfg.endpoint {
                    builder = builder.endpoint_url(endpoint).force_path_style(true);
                }
                (Client::from_conf(builder.build()), true)
            }
            None => {
                info!("no static store credentials; falling back to default chain, public URLs");
                let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
                let mut builder = aws_sdk_s3::config::Builder::from(&shared)
                    .region(Region::new(cfg.region.clone()));
                if let Some(endpoint) = &cfg.endpoint {
                    builder = builder.endpoint_url(endpoint).force_path_style(true);
                }
                (Client::from_conf(builder.build()), false)
            }
        };

        Ok(Self {
            client,
            bucket: cfg.bucket.clone(),
            region: cfg.region.clone(),
            endpoint: cfg.endpoint.clone(),
            public_base_url: cfg.public_base_url.clone(),
            signing_available,
        })
    }
}

/// Explicit credential pair from configuration, if both halves are present.
fn static_credentials(cfg: &AppConfig) -> Option<Credentials> {
    match (&cfg.access_key_id, &cfg.secret_access_key) {
        (Some(id), Some(secret)) => Some(Credentials::new(
            id,
            secret,
            None,
            None,
            "media-gallery-config",
        )),
        _ => None,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_not_found() {
                    Ok(false)
                } else {
                    Err(StoreError::request("head", key, service))
                }
            }
        }
    }

    async fn get_bytes(&self, key: &str) -> StoreResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    StoreError::NotFound(key.to_string())
                } else {
                    StoreError::request("get", key, service)
                }
            })?;

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| StoreError::request("get", key, err))?
            .into_bytes();
        debug!(key, size = bytes.len(), "downloaded object");

        Ok(ObjectBody {
            bytes,
            content_type,
        })
    }

    async fn size(&self, key: &str) -> StoreResult<u64> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service = err.into_service_error();
                if service.is_not_found() {
                    StoreError::NotFound(key.to_string())
                } else {
                    StoreError::request("head", key, service)
                }
            })?;
        Ok(output.content_length().unwrap_or(0).max(0) as u64)
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>> {
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|err| StoreError::request("list", prefix, err.into_service_error()))?;

            for object in output.contents() {
                let Some(key) = object.key() else { continue };
                entries.push(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object
                        .last_modified()
                        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                });
            }

            match (output.is_truncated(), output.next_continuation_token()) {
                (Some(true), Some(token)) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String> {
        let presigning = PresigningConfig::builder()
            .expires_in(ttl)
            .build()
            .map_err(|err| StoreError::request("sign", key, err))?;

        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(disposition) = disposition {
            request = request.response_content_disposition(disposition);
        }

        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|err| StoreError::request("sign", key, err.into_service_error()))?;
        Ok(presigned.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        if let Some(base) = &self.public_base_url {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    fn can_sign(&self) -> bool {
        self.signing_available
    }

    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StoreResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| StoreError::request("put", key, err))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| StoreError::request("put", key, err.into_service_error()))?;
        debug!(key, "uploaded object");
        Ok(())
    }
}
