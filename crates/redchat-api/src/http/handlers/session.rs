//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/chats?limit=N   - List the caller's sessions
//! - POST /api/chat/history    - Stored turns of one session
//! - POST /api/chat/delete     - Delete one session
//! - POST /api/chats/clear     - Delete all of the caller's sessions

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use redchat_types::chat::{ChatSummary, Turn};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::query::ApiQuery;
use crate::http::extractors::user::UserId;
use crate::state::AppState;

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<u32>,
}

/// Body naming one session.
#[derive(Debug, Deserialize)]
pub struct SessionRef {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub success: bool,
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub deleted: u64,
}

/// GET /api/chats - List sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    user: UserId,
    ApiQuery(query): ApiQuery<SessionListQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let chats = state
        .chat_service
        .list_sessions(user.as_str(), query.limit)
        .await?;
    Ok(Json(SessionListResponse {
        success: true,
        chats,
    }))
}

/// POST /api/chat/history - Turns of one session (empty when unknown).
pub async fn get_history(
    State(state): State<AppState>,
    user: UserId,
    ApiJson(body): ApiJson<SessionRef>,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = state
        .chat_service
        .get_history(user.as_str(), &body.session_id)
        .await?;
    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

/// POST /api/chat/delete - Delete one session. Idempotent.
pub async fn delete_session(
    State(state): State<AppState>,
    user: UserId,
    ApiJson(body): ApiJson<SessionRef>,
) -> Result<Json<DeleteResponse>, AppError> {
    state
        .chat_service
        .delete_session(user.as_str(), &body.session_id)
        .await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /api/chats/clear - Delete every session the caller owns.
pub async fn clear_sessions(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<ClearResponse>, AppError> {
    let deleted = state.chat_service.clear_sessions(user.as_str()).await?;
    Ok(Json(ClearResponse {
        success: true,
        deleted,
    }))
}
