//! Application error type mapping to HTTP status codes.
//!
//! This is the only place response statuses for failures are chosen. The
//! underlying error is logged; clients only ever see a fixed, user-facing
//! message in `{"success": false, "error": ...}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use redchat_types::error::ChatError;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "AI service not configured. Please contact administrator.";
pub const UNAVAILABLE_MESSAGE: &str = "AI service temporarily unavailable. Please try again.";
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit reached. Please wait a moment and try again.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const NOT_FOUND_MESSAGE: &str = "Route not found";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors raised by the chat service.
    Chat(ChatError),
    /// Malformed request body or parameters.
    Validation(String),
    /// No route matched.
    NotFound,
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Chat(ChatError::Invalid(msg)) | AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Chat(ChatError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                NOT_CONFIGURED_MESSAGE.to_string(),
            ),
            AppError::Chat(ChatError::Llm(e)) if e.is_rate_limited() => (
                StatusCode::TOO_MANY_REQUESTS,
                RATE_LIMITED_MESSAGE.to_string(),
            ),
            AppError::Chat(ChatError::Llm(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                UNAVAILABLE_MESSAGE.to_string(),
            ),
            AppError::Chat(ChatError::Repository(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            AppError::Chat(ChatError::Llm(e)) => {
                tracing::warn!(error = %e, status = status.as_u16(), "completion failed");
            }
            AppError::Chat(ChatError::Repository(e)) => {
                tracing::error!(error = %e, "session store failure");
            }
            AppError::Chat(ChatError::NotConfigured) => {
                tracing::warn!("chat request while no provider is configured");
            }
            _ => tracing::debug!(status = status.as_u16(), %message, "request rejected"),
        }

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
