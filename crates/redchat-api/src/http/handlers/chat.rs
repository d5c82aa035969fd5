//! Chat turn HTTP handler.
//!
//! Endpoints:
//! - POST /api/chat - Send a prompt, get the reply and the session title
//! - POST /chat     - Same handler, kept for clients of the single-form page

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use redchat_core::chat::service::TurnRequest;
use redchat_types::chat::Turn;

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::user::UserId;
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default, alias = "message")]
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_incognito: bool,
    /// Only read for incognito turns.
    #[serde(default)]
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub chat_title: Option<String>,
    pub session_id: String,
}

/// POST /api/chat - Run one chat turn.
pub async fn send_chat(
    State(state): State<AppState>,
    user: UserId,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let outcome = state
        .chat_service
        .send_turn(TurnRequest {
            user_id: user.0,
            session_id: body.session_id,
            prompt: body.prompt,
            incognito: body.is_incognito,
            client_history: body.history,
        })
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        response: outcome.response,
        chat_title: outcome.chat_title,
        session_id: outcome.session_id,
    }))
}
