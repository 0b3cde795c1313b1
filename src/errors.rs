use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                reason.clone(),
            ),
            AppError::Store(StoreError::InvalidInput(reason)) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_input",
                reason.to_string(),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
