//! Route table for the gallery.
//!
//! ## Structure
//! - **Pages**
//!   - `GET /`                 — index
//!   - `GET /photos`           — album selection
//!   - `GET /videos`           — video event selection
//!   - `GET /photos/{album}`   — album grid
//!   - `GET /wedding_videos`, `/mehdi_videos`, `/haldi_videos` — per-event listings
//!
//! - **Assets**
//!   - `GET /serve_image/{*key}`       — normalized full image
//!   - `GET /serve_thumbnail/{*key}`   — normalized thumbnail
//!   - `GET /download/{album}/{segment}/{file}/{quality}` — attachment download
//!   - five static icon/manifest routes under the bucket's `favicon_io/` prefix
//!
//! - **Video URL API**
//!   - `POST /get_video_url`   — JSON `{url}`
//!   - `POST /stream_video`    — JSON `{url, quality}`
//!   - `GET|POST /download_video` — redirect/JSON, with proxy fallback
//!
//! The wildcard `{*key}` allows nested keys like `wedding_photos/sd/img.jpg`.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    health_handlers::{healthz, readyz},
    media_handlers::{
        download_image, download_video, download_video_redirect, get_video_url, serve_image,
        serve_thumbnail, stream_video,
    },
    page_handlers::{
        album_photos, haldi_videos, index, mehdi_videos, photos_selection, videos_selection,
        wedding_videos,
    },
    static_handlers::{apple_touch_icon, favicon, favicon_16, favicon_32, webmanifest},
};
use crate::services::{delivery_service::DeliveryService, listing_service::ListingService};
use crate::storage::ObjectStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub delivery: DeliveryService,
    pub listing: ListingService,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        let delivery = DeliveryService::new(store.clone());
        let listing = ListingService::new(store, delivery.clone());
        Self { delivery, listing }
    }
}

/// Build and return the router for all gallery routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // pages
        .route("/", get(index))
        .route("/photos", get(photos_selection))
        .route("/videos", get(videos_selection))
        .route("/photos/{album}", get(album_photos))
        .route("/wedding_videos", get(wedding_videos))
        .route("/mehdi_videos", get(mehdi_videos))
        .route("/haldi_videos", get(haldi_videos))
        // assets
        .route("/serve_image/{*key}", get(serve_image))
        .route("/serve_thumbnail/{*key}", get(serve_thumbnail))
        .route(
            "/download/{album}/{segment}/{file}/{quality}",
            get(download_image),
        )
        // video URL API
        .route("/get_video_url", post(get_video_url))
        .route("/stream_video", post(stream_video))
        .route(
            "/download_video",
            get(download_video_redirect).post(download_video),
        )
        // static icons and manifest
        .route("/favicon.ico", get(favicon))
        .route("/apple-touch-icon.png", get(apple_touch_icon))
        .route("/favicon-32x32.png", get(favicon_32))
        .route("/favicon-16x16.png", get(favicon_16))
        .route("/site.webmanifest", get(webmanifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryObjectStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn app(store: InMemoryObjectStore) -> Router {
        routes().with_state(AppState::new(Arc::new(store)))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn healthz_is_alive() {
        let response = app(InMemoryObjectStore::new())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_image_key_is_404() {
        let response = app(InMemoryObjectStore::new())
            .oneshot(
                Request::get("/serve_image/wedding_photos/sd/none.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_video_url_requires_video_path() {
        let response = app(InMemoryObjectStore::new())
            .oneshot(
                Request::post("/get_video_url")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("video_path"));
    }

    #[tokio::test]
    async fn get_video_url_returns_signed_url() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_videos/720p/c.mp4", &b"v"[..], "video/mp4")
            .await;
        let response = app(store)
            .oneshot(
                Request::post("/get_video_url")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"video_path":"wedding_videos/720p/c.mp4","purpose":"stream"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("\"url\""));
        assert!(body.contains("X-Amz-Expires=1800"));
    }

    #[tokio::test]
    async fn album_page_degrades_to_zero_count() {
        let response = app(InMemoryObjectStore::new())
            .oneshot(
                Request::get("/photos/wedding")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("0 photos"));
    }

    #[tokio::test]
    async fn download_redirects_to_issued_url() {
        let store = InMemoryObjectStore::new();
        store
            .put("wedding_photos/sd/x.jpg", &b"abc"[..], "image/jpeg")
            .await;
        let response = app(store)
            .oneshot(
                Request::get("/download/wedding/sd/x.jpg/sd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(location.contains("wedding_photos/sd/x.jpg"));
    }

    #[tokio::test]
    async fn download_falls_back_to_attachment_bytes() {
        let store = InMemoryObjectStore::with_failing_signer();
        store
            .put("wedding_photos/sd/x.jpg", &b"abcdef"[..], "image/jpeg")
            .await;
        let response = app(store)
            .oneshot(
                Request::get("/download/wedding/sd/x.jpg/sd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"x_sd.jpg\"");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 6);
    }

    #[tokio::test]
    async fn download_of_missing_object_is_404() {
        let response = app(InMemoryObjectStore::with_failing_signer())
            .oneshot(
                Request::get("/download/wedding/sd/none.jpg/sd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
