use crate::core::SentimentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by request handlers, rendered as `{"error": message}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request body is missing a required field or has the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// Anything that went wrong while running the model.
    #[error("{0}")]
    Inference(#[from] SentimentError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Validation(msg) => tracing::debug!(%status, "rejected request: {msg}"),
            ApiError::Inference(err) => tracing::warn!(%status, "inference failed: {err}"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
