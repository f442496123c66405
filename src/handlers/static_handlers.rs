//! The five static icon/manifest routes, all backed by objects under the
//! bucket's `favicon_io/` prefix and served byte-for-byte.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, header},
    response::Response,
};

use crate::errors::AppError;
use crate::routes::routes::AppState;

pub async fn favicon(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_static(&state, "favicon_io/favicon.ico", "image/x-icon").await
}

pub async fn apple_touch_icon(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_static(&state, "favicon_io/apple-touch-icon.png", "image/png").await
}

pub async fn favicon_32(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_static(&state, "favicon_io/favicon-32x32.png", "image/png").await
}

pub async fn favicon_16(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_static(&state, "favicon_io/favicon-16x16.png", "image/png").await
}

pub async fn webmanifest(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_static(
        &state,
        "favicon_io/site.webmanifest",
        "application/manifest+json",
    )
    .await
}

async fn serve_static(
    state: &AppState,
    key: &str,
    fallback_content_type: &'static str,
) -> Result<Response, AppError> {
    let body = state.delivery.serve_raw(key).await?;
    let content_type = body
        .content_type
        .unwrap_or_else(|| fallback_content_type.to_string());

    let mut response = Response::new(Body::from(body.bytes));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    Ok(response)
}
