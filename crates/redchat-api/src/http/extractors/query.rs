//! Query-string extractor whose rejections use the API error shape.

use axum::extract::FromRequestParts;

use crate::http::error::AppError;

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
