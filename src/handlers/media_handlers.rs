//! Handlers for image serving, downloads, and the video URL API.
//!
//! Each handler resolves keys through the path conventions, delegates to the
//! delivery service, and converts component errors at this boundary via
//! `AppError`.

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::imaging;
use crate::models::video::VideoQuality;
use crate::paths;
use crate::routes::routes::AppState;
use crate::services::delivery_service::{Download, VideoPurpose, VideoRelay};

/// GET `/serve_image/{*key}` — normalized full-resolution image.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state
        .delivery
        .serve_image(&key, imaging::FULL_QUALITY)
        .await?;
    Ok(image_response(bytes))
}

/// GET `/serve_thumbnail/{*key}` — the same filename resolved under the
/// album's `thumbnails/` segment, served at thumbnail quality.
pub async fn serve_thumbnail(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let album = key.split('/').next().unwrap_or("");
    let thumbnail_key = paths::photo_thumbnail_key(album, &key);
    let bytes = state
        .delivery
        .serve_image(&thumbnail_key, imaging::THUMBNAIL_QUALITY)
        .await?;
    Ok(image_response(bytes))
}

/// GET `/download/{album}/{segment}/{file}/{quality}` — attachment download,
/// redirect mode with a direct-bytes fallback.
pub async fn download_image(
    State(state): State<AppState>,
    Path((album, segment, file, quality)): Path<(String, String, String, String)>,
) -> Result<Response, AppError> {
    match state
        .delivery
        .download_image(&album, &segment, &file, &quality)
        .await?
    {
        Download::Redirect(url) => Ok(Redirect::to(&url).into_response()),
        Download::Bytes {
            data,
            filename,
            content_type,
        } => {
            let length = data.len() as u64;
            attachment_response(Body::from(data), &filename, &content_type, Some(length))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VideoUrlRequest {
    pub video_path: Option<String>,
    pub quality: Option<String>,
    pub purpose: Option<String>,
}

/// POST `/get_video_url` — JSON `{url}` for playback or download.
pub async fn get_video_url(
    State(state): State<AppState>,
    Json(request): Json<VideoUrlRequest>,
) -> Result<Response, AppError> {
    let video_path = required_path(request.video_path.as_deref())?;
    let quality = parse_quality(request.quality.as_deref())?;
    let purpose = VideoPurpose::from_param(request.purpose.as_deref());

    let url = state.delivery.video_url(video_path, quality, purpose).await?;
    Ok(Json(json!({ "url": url })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub video_path: Option<String>,
    pub quality: Option<String>,
}

/// POST `/stream_video` — JSON `{url, quality}` with the streaming TTL.
pub async fn stream_video(
    State(state): State<AppState>,
    Json(request): Json<VideoRequest>,
) -> Result<Response, AppError> {
    let video_path = required_path(request.video_path.as_deref())?;
    let quality = parse_quality(request.quality.as_deref())?;

    let url = state
        .delivery
        .video_url(video_path, quality, VideoPurpose::Stream)
        .await?;
    let quality_label = quality
        .map(|q| q.as_str().to_string())
        .or_else(|| paths::quality_segment(video_path).map(str::to_string))
        .unwrap_or_default();
    Ok(Json(json!({ "url": url, "quality": quality_label })).into_response())
}

/// POST `/download_video` — JSON `{url, filename}`, or the bytes themselves
/// relayed through the service when URL issuance fails.
pub async fn download_video(
    State(state): State<AppState>,
    Json(request): Json<VideoRequest>,
) -> Result<Response, AppError> {
    let video_path = required_path(request.video_path.as_deref())?.to_string();
    let quality = parse_quality(request.quality.as_deref())?;

    match state.delivery.video_download(&video_path, quality).await {
        Ok((url, filename)) => Ok(Json(json!({ "url": url, "filename": filename })).into_response()),
        Err(AppError::Upstream(reason)) => {
            tracing::warn!(%video_path, %reason, "URL issuance failed, proxying bytes");
            let relay = state.delivery.proxy_video(&video_path, quality).await?;
            relay_response(relay)
        }
        Err(other) => Err(other),
    }
}

/// GET `/download_video?video_path=&quality=` — redirect variant of the
/// download entry point, with the same proxy fallback.
pub async fn download_video_redirect(
    State(state): State<AppState>,
    Query(request): Query<VideoRequest>,
) -> Result<Response, AppError> {
    let video_path = required_path(request.video_path.as_deref())?.to_string();
    let quality = parse_quality(request.quality.as_deref())?;

    match state.delivery.video_download(&video_path, quality).await {
        Ok((url, _)) => Ok(Redirect::to(&url).into_response()),
        Err(AppError::Upstream(reason)) => {
            tracing::warn!(%video_path, %reason, "URL issuance failed, proxying bytes");
            let relay = state.delivery.proxy_video(&video_path, quality).await?;
            relay_response(relay)
        }
        Err(other) => Err(other),
    }
}

fn required_path(video_path: Option<&str>) -> Result<&str, AppError> {
    match video_path {
        Some(path) if !path.trim().is_empty() => Ok(path),
        _ => Err(AppError::BadRequest("missing video_path".to_string())),
    }
}

fn parse_quality(quality: Option<&str>) -> Result<Option<VideoQuality>, AppError> {
    match quality {
        None => Ok(None),
        Some(value) => VideoQuality::parse(value).map(Some).ok_or_else(|| {
            AppError::BadRequest(format!("unknown quality `{}`", value))
        }),
    }
}

fn image_response(bytes: bytes::Bytes) -> Response {
    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("image/jpeg"),
    );
    response
}

fn attachment_response(
    body: Body,
    filename: &str,
    content_type: &str,
    content_length: Option<u64>,
) -> Result<Response, AppError> {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|_| AppError::BadRequest("invalid attachment filename".to_string()))?,
    );
    if let Some(length) = content_length {
        if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
            headers.insert(header::CONTENT_LENGTH, value);
        }
    }
    Ok(response)
}

fn relay_response(relay: VideoRelay) -> Result<Response, AppError> {
    let VideoRelay {
        filename,
        content_type,
        content_length,
        response,
    } = relay;
    attachment_response(
        Body::from_stream(response.bytes_stream()),
        &filename,
        &content_type,
        content_length,
    )
}
