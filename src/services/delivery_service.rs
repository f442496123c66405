//! Media delivery core.
//!
//! Maps a resolved object key to an HTTP-level outcome: normalized image
//! bytes, a time-limited URL to redirect to, or a relayed byte stream when
//! URL issuance is unavailable. Holds no per-request state; the store handle
//! and the proxy client are the only long-lived members.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::imaging;
use crate::models::video::VideoQuality;
use crate::paths;
use crate::storage::{ObjectBody, ObjectStore, content_type_for_key};

/// TTL for playback/streaming URLs.
pub const STREAM_URL_TTL: Duration = Duration::from_secs(30 * 60);

/// TTL for video download URLs.
pub const VIDEO_DOWNLOAD_URL_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for image download URLs.
pub const IMAGE_DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// TTL for browse-time poster URLs embedded in listing pages.
pub const BROWSE_URL_TTL: Duration = Duration::from_secs(30 * 60);

/// Caller intent for a video URL request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPurpose {
    Stream,
    Download,
}

impl VideoPurpose {
    /// Anything other than an explicit `stream` is treated as a download.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("stream") => VideoPurpose::Stream,
            _ => VideoPurpose::Download,
        }
    }
}

/// Outcome of a download request: redirect mode or direct bytes.
pub enum Download {
    Redirect(String),
    Bytes {
        data: Bytes,
        filename: String,
        content_type: String,
    },
}

/// An in-flight proxy relay for the download-via-server path.
pub struct VideoRelay {
    pub filename: String,
    pub content_type: String,
    /// Total byte count of the source object.
    pub content_length: Option<u64>,
    pub response: reqwest::Response,
}

#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
}

impl DeliveryService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Fetch and normalize an image. An absent key is terminal; there is no
    /// fallback byte source for images.
    pub async fn serve_image(&self, key: &str, quality: u8) -> Result<Bytes, AppError> {
        if !self.store.exists(key).await? {
            warn!(key, "image not found");
            return Err(AppError::NotFound(format!("image `{}` not found", key)));
        }
        let body = self.store.get_bytes(key).await?;
        let jpeg = imaging::normalize(&body.bytes, quality)?;
        Ok(Bytes::from(jpeg))
    }

    /// Fetch an object untouched, with its stored content type. Used for the
    /// favicon/manifest assets.
    pub async fn serve_raw(&self, key: &str) -> Result<ObjectBody, AppError> {
        if !self.store.exists(key).await? {
            return Err(AppError::NotFound(format!("object `{}` not found", key)));
        }
        Ok(self.store.get_bytes(key).await?)
    }

    /// The single URL decision point: a signed URL when the store holds a
    /// signing credential, the public bucket URL otherwise. Every route that
    /// hands out a URL goes through here.
    pub async fn issue_url(
        &self,
        key: &str,
        ttl: Duration,
        disposition: Option<&str>,
    ) -> Result<String, AppError> {
        if self.store.can_sign() {
            let url = self.store.signed_url(key, ttl, disposition).await?;
            Ok(url)
        } else {
            Ok(self.store.public_url(key))
        }
    }

    /// Resolve a playback or download URL for a video.
    ///
    /// An absent object is terminal for every purpose; only the TTL and the
    /// disposition differ between streaming and downloading.
    pub async fn video_url(
        &self,
        video_path: &str,
        quality: Option<VideoQuality>,
        purpose: VideoPurpose,
    ) -> Result<String, AppError> {
        let key = self.resolve_video_key(video_path, quality)?;
        if !self.store.exists(&key).await? {
            warn!(key, "video not found");
            return Err(AppError::NotFound(format!("video `{}` not found", key)));
        }

        match purpose {
            VideoPurpose::Stream => self.issue_url(&key, STREAM_URL_TTL, None).await,
            VideoPurpose::Download => {
                let disposition =
                    format!("attachment; filename=\"{}\"", self.video_filename(&key));
                self.issue_url(&key, VIDEO_DOWNLOAD_URL_TTL, Some(&disposition))
                    .await
            }
        }
    }

    /// Download URL plus the attachment filename the client should save as.
    pub async fn video_download(
        &self,
        video_path: &str,
        quality: Option<VideoQuality>,
    ) -> Result<(String, String), AppError> {
        let key = self.resolve_video_key(video_path, quality)?;
        let filename = self.video_filename(&key);
        let url = self
            .video_url(video_path, quality, VideoPurpose::Download)
            .await?;
        Ok((url, filename))
    }

    /// Relay a video through the service. Used only when URL issuance fails
    /// on the download entry point; an absent object stays terminal.
    pub async fn proxy_video(
        &self,
        video_path: &str,
        quality: Option<VideoQuality>,
    ) -> Result<VideoRelay, AppError> {
        let key = self.resolve_video_key(video_path, quality)?;
        if !self.store.exists(&key).await? {
            return Err(AppError::NotFound(format!("video `{}` not found", key)));
        }

        let size = self.store.size(&key).await?;

        let url = self.store.public_url(&key);
        info!(key, "relaying video bytes through the service");
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for_key(&key).to_string());

        Ok(VideoRelay {
            filename: self.video_filename(&key),
            content_type,
            content_length: response.content_length().or(Some(size)),
            response,
        })
    }

    /// Resolve an image download to redirect mode, degrading to a direct
    /// byte fetch when URL issuance fails. Absence is checked first and is
    /// terminal either way.
    pub async fn download_image(
        &self,
        album: &str,
        segment: &str,
        filename: &str,
        quality: &str,
    ) -> Result<Download, AppError> {
        let key = paths::photo_key(album, segment, filename);
        info!(key, "image download requested");
        if !self.store.exists(&key).await? {
            warn!(key, "download image not found");
            return Err(AppError::NotFound(format!("image `{}` not found", key)));
        }

        let attachment_name = paths::download_name(filename, quality, "jpg");
        let disposition = format!("attachment; filename=\"{}\"", attachment_name);
        match self
            .issue_url(&key, IMAGE_DOWNLOAD_URL_TTL, Some(&disposition))
            .await
        {
            Ok(url) => Ok(Download::Redirect(url)),
            Err(err) => {
                warn!(key, error = %err, "redirect mode failed, serving bytes directly");
                let body = self.store.get_bytes(&key).await?;
                Ok(Download::Bytes {
                    data: body.bytes,
                    filename: attachment_name,
                    content_type: body.content_type.unwrap_or_else(|| "image/jpeg".to_string()),
                })
            }
        }
    }

    fn resolve_video_key(
        &self,
        video_path: &str,
        quality: Option<VideoQuality>,
    ) -> Result<String, AppError> {
        if video_path.trim().is_empty() {
            return Err(AppError::BadRequest("missing video_path".to_string()));
        }
        Ok(match quality {
            Some(quality) => paths::with_quality(video_path, quality.as_str()),
            None => video_path.to_string(),
        })
    }

    fn video_filename(&self, key: &str) -> String {
        let quality = paths::quality_segment(key).unwrap_or("video");
        paths::download_name(paths::file_name(key), quality, "mp4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryObjectStore;

    fn service(store: InMemoryObjectStore) -> DeliveryService {
        DeliveryService::new(Arc::new(store))
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 200]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut out),
                image::ImageFormat::Png,
            )
            .unwrap();
        out
    }

    #[tokio::test]
    async fn serve_image_normalizes_to_jpeg() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_photos/sd/a.png", tiny_png(), "image/png")
            .await;
        let delivery = service(store);

        let bytes = delivery
            .serve_image("wedding_photos/sd/a.png", imaging::FULL_QUALITY)
            .await
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[tokio::test]
    async fn serve_image_absent_key_is_not_found() {
        let delivery = service(InMemoryObjectStore::new());
        assert!(matches!(
            delivery.serve_image("missing.jpg", imaging::FULL_QUALITY).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn serve_image_undecodable_payload_is_decode_error() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_photos/sd/bad.jpg", &b"not an image"[..], "image/jpeg")
            .await;
        let delivery = service(store);
        assert!(matches!(
            delivery
                .serve_image("wedding_photos/sd/bad.jpg", imaging::FULL_QUALITY)
                .await,
            Err(AppError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn stream_urls_get_thirty_minutes() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_videos/720p/c.mp4", &b"v"[..], "video/mp4")
            .await;
        let delivery = service(store);

        let url = delivery
            .video_url("wedding_videos/720p/c.mp4", None, VideoPurpose::Stream)
            .await
            .unwrap();
        assert!(url.contains("X-Amz-Expires=1800"));
    }

    #[tokio::test]
    async fn download_urls_get_five_minutes_and_attachment_name() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_videos/720p/c.mp4", &b"v"[..], "video/mp4")
            .await;
        let delivery = service(store);

        let (url, filename) = delivery
            .video_download("wedding_videos/720p/c.mp4", None)
            .await
            .unwrap();
        assert!(url.contains("X-Amz-Expires=300"));
        assert!(url.contains("c_720p.mp4"));
        assert_eq!(filename, "c_720p.mp4");
    }

    #[tokio::test]
    async fn quality_override_repoints_the_key() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_videos/1080p/c.mp4", &b"v"[..], "video/mp4")
            .await;
        let delivery = service(store);

        let url = delivery
            .video_url(
                "wedding_videos/360p/c.mp4",
                Some(VideoQuality::Q1080),
                VideoPurpose::Stream,
            )
            .await
            .unwrap();
        assert!(url.contains("/1080p/"));
    }

    #[tokio::test]
    async fn absent_video_is_terminal_for_every_purpose() {
        let delivery = service(InMemoryObjectStore::new());
        for purpose in [VideoPurpose::Stream, VideoPurpose::Download] {
            assert!(matches!(
                delivery
                    .video_url("wedding_videos/720p/none.mp4", None, purpose)
                    .await,
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn empty_video_path_is_bad_request() {
        let delivery = service(InMemoryObjectStore::new());
        assert!(matches!(
            delivery.video_url("  ", None, VideoPurpose::Stream).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn issue_url_without_credential_is_public() {
        let delivery = service(InMemoryObjectStore::without_signing());
        let url = delivery
            .issue_url("wedding_videos/720p/c.mp4", STREAM_URL_TTL, None)
            .await
            .unwrap();
        assert_eq!(url, "https://public.store.invalid/wedding_videos/720p/c.mp4");
    }

    #[tokio::test]
    async fn download_image_redirects_when_signing_works() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_photos/sd/x.jpg", &b"abc"[..], "image/jpeg")
            .await;
        let delivery = service(store);

        match delivery
            .download_image("wedding", "sd", "x.jpg", "sd")
            .await
            .unwrap()
        {
            Download::Redirect(url) => {
                assert!(url.contains("X-Amz-Expires=900"));
                assert!(url.contains("x_sd.jpg"));
            }
            Download::Bytes { .. } => panic!("expected redirect mode"),
        }
    }

    #[tokio::test]
    async fn download_image_falls_back_to_bytes_on_signing_failure() {
        let store = InMemoryObjectStore::with_failing_signer();
        store
            .put("wedding_photos/sd/x.jpg", &b"abcdef"[..], "image/jpeg")
            .await;
        let delivery = service(store);

        match delivery
            .download_image("wedding_photos", "sd", "x.jpg", "sd")
            .await
            .unwrap()
        {
            Download::Bytes {
                data,
                filename,
                content_type,
            } => {
                assert_eq!(data.len(), 6);
                assert_eq!(filename, "x_sd.jpg");
                assert_eq!(content_type, "image/jpeg");
            }
            Download::Redirect(_) => panic!("expected byte fallback"),
        }
    }

    #[tokio::test]
    async fn download_image_absent_key_never_falls_back() {
        let delivery = service(InMemoryObjectStore::with_failing_signer());
        assert!(matches!(
            delivery.download_image("wedding", "sd", "x.jpg", "sd").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn proxy_absent_video_is_terminal() {
        let delivery = service(InMemoryObjectStore::new());
        assert!(matches!(
            delivery.proxy_video("wedding_videos/720p/none.mp4", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn purpose_defaults_to_download() {
        assert_eq!(VideoPurpose::from_param(Some("stream")), VideoPurpose::Stream);
        assert_eq!(VideoPurpose::from_param(Some("other")), VideoPurpose::Download);
        assert_eq!(VideoPurpose::from_param(None), VideoPurpose::Download);
    }
}
