use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::AppState;

const CTYPE_JSON: &str = "application/json";

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct SaveSecretRequest {
    #[serde(default)]
    pub plain_text: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SaveSecretResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize)]
pub struct SecretDataResponse {
    pub data: String,
}

// ── Handlers ─────────────────────────────────────────────────

pub async fn healthcheck() -> &'static str {
    "ok"
}

/// POST /: store a secret, answer with its id.
pub async fn save_secret(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SaveSecretResponse>, AppError> {
    if !is_json(&headers) {
        return Err(AppError::BadRequest(format!(
            "Content-Type must be {}",
            CTYPE_JSON
        )));
    }

    let input: SaveSecretRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let plain_text = match input.plain_text {
        Some(p) if !p.is_empty() => p,
        _ => return Err(AppError::BadRequest("plain_text value is empty".into())),
    };

    let id = state.store.save(&plain_text).await?;
    Ok(Json(SaveSecretResponse { id }))
}

/// GET /:id: hand out the secret and forget it.
pub async fn consume_secret(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if id.is_empty() {
        return Ok(secret_not_found());
    }

    match state.store.consume(&id).await? {
        Some(data) => Ok(Json(SecretDataResponse { data }).into_response()),
        None => Ok(secret_not_found()),
    }
}

/// GET /: no id given.
pub async fn missing_id() -> Response {
    secret_not_found()
}

/// Anything the router does not know: reads look like a missing secret,
/// every other method is refused.
pub async fn fallback(method: Method) -> Response {
    if method == Method::GET {
        secret_not_found()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

pub async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

fn secret_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(SecretDataResponse {
            data: String::new(),
        }),
    )
        .into_response()
}

/// Media type check that ignores parameters such as `charset`.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(CTYPE_JSON))
        .unwrap_or(false)
}
