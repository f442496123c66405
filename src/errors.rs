//! Request-level error taxonomy.
//!
//! Components return their own error types (`StoreError`, `NormalizeError`);
//! handlers convert them into [`AppError`] via the `From` impls below, and a
//! single `IntoResponse` translator maps each kind to an HTTP status with the
//! JSON body `{"error": ..., "status": ...}`. Nothing is retried and nothing
//! escalates past the request.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::imaging::NormalizeError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Object or key absent from the store.
    #[error("{0}")]
    NotFound(String),
    /// Missing or malformed request parameter.
    #[error("{0}")]
    BadRequest(String),
    /// Store, signing, or proxy call failed.
    #[error("{0}")]
    Upstream(String),
    /// Image bytes could not be parsed or re-encoded.
    #[error("{0}")]
    Decode(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => AppError::NotFound(format!("object `{}` not found", key)),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound("a/b.jpg".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_request_failure_maps_to_500() {
        let err: AppError = StoreError::request("get", "a/b.jpg", "boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn decode_failure_maps_to_500() {
        let err: AppError = NormalizeError::Decode("bad magic".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
