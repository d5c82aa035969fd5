//! Caller identity extractor.
//!
//! The user id comes from the `X-User-Id` header. Absent, blank, or
//! non-UTF-8 values fall back to the shared "anonymous" user; values are
//! trimmed and capped at [`MAX_USER_ID_CHARS`] characters.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use redchat_types::chat::ANONYMOUS_USER;

pub const USER_ID_HEADER: &str = "x-user-id";

pub const MAX_USER_ID_CHARS: usize = 128;

/// Owner of the sessions a request touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(user_id_from_parts(parts))
    }
}

fn user_id_from_parts(parts: &Parts) -> UserId {
    let id = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.chars().take(MAX_USER_ID_CHARS).collect::<String>())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());
    UserId(id)
}
