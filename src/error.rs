use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::InvalidRecordId;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("invalid id format: {0}")]
    InvalidId(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Detail of a server-side failure, attached to the response so that
/// non-production deployments can surface it to the client.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl From<InvalidRecordId> for AppError {
    fn from(err: InvalidRecordId) -> Self {
        AppError::InvalidId(err.0)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": "Validation failed",
                    "errors": errors,
                }),
            ),
            AppError::InvalidId(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": "Invalid ID format" }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": msg }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "success": false, "error": msg }),
            ),
            AppError::Store(_) | AppError::Internal(_) | AppError::Config(_) => {
                tracing::error!(error = %self, "request failed");

                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Internal server error" })),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail(self.to_string()));
                return response;
            }
        };

        (status, Json(body)).into_response()
    }
}
