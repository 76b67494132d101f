use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Request failures, rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image")]
    NoImage,

    #[error("Invalid file")]
    InvalidFile,

    #[error("Empty image")]
    EmptyImage,

    #[error("Could not decode image")]
    Undecodable(#[source] image::ImageError),

    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImage
            | ApiError::InvalidFile
            | ApiError::EmptyImage
            | ApiError::Undecodable(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Query(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(e) => error!("Failed to analyze face: {e:?}"),
            ApiError::Undecodable(e) => debug!("Rejected upload: {e}"),
            other => debug!("Rejected upload: {other}"),
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
