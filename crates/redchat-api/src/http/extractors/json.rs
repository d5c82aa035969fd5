//! JSON body extractor whose rejections use the API error shape.
//!
//! `axum::Json` rejects malformed bodies with plain-text responses; routing
//! the rejection through [`AppError`] keeps every failure as
//! `{"success": false, "error": ...}` with status 400.

use axum::extract::FromRequest;

use crate::http::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
