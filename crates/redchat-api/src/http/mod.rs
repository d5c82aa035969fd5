//! HTTP/JSON API layer for redchat.
//!
//! Axum routes under `/api/` scoped per user by the `X-User-Id` header,
//! with a `{success, ...}` response shape and permissive CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
