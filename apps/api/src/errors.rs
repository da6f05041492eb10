use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::DateTime;
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders a JSON body with a flat `error` string; nothing in
/// the request path panics on a failure the upstream or the client can cause.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Daily analysis quota exceeded")]
    QuotaExceeded { limit: u32, reset_at: i64 },

    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to parse model response")]
    ModelParse { raw: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::QuotaExceeded { limit, reset_at } => {
                let mut headers = HeaderMap::new();
                headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
                headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(0));
                headers.insert(RATE_LIMIT_RESET, HeaderValue::from(reset_at));
                let body = Json(json!({
                    "error": "Daily free analysis quota exceeded.",
                    "message": format!("Quota resets at {}", format_reset(reset_at)),
                    "resetAt": reset_at,
                }));
                (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
            }
            AppError::Llm(LlmError::MissingApiKey) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Server configuration error: API key is not set." })),
            )
                .into_response(),
            AppError::Llm(e) => {
                tracing::error!("model call failed: {e}");
                let body = match &e {
                    LlmError::Api { status, .. } => {
                        json!({ "error": format!("Upstream model error (status {status})") })
                    }
                    _ => json!({ "error": "Upstream model call failed" }),
                };
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
            AppError::ModelParse { raw } => {
                tracing::error!("failed to parse model response; raw text follows:\n{raw}");
                let body = Json(json!({
                    "error": "Failed to parse model response",
                    "rawResponse": raw,
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "A database error occurred" })),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal server error occurred" })),
                )
                    .into_response()
            }
        }
    }
}

fn format_reset(reset_at: i64) -> String {
    DateTime::from_timestamp_millis(reset_at)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| reset_at.to_string())
}
