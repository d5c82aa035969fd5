//! Voice text HTTP handler.
//!
//! POST /api/voice/process - Tidy dictated text, optionally translate it.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    #[serde(default)]
    pub text: String,
    /// Language to translate into; absent or "auto" keeps the original.
    #[serde(default)]
    pub target_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub success: bool,
    pub processed_text: String,
}

/// POST /api/voice/process
pub async fn process_voice(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VoiceRequest>,
) -> Result<Json<VoiceResponse>, AppError> {
    let processed_text = state
        .chat_service
        .process_voice(&body.text, body.target_lang.as_deref())
        .await?;
    Ok(Json(VoiceResponse {
        success: true,
        processed_text,
    }))
}
