//! Prompt assembly: persona + recent history + the new user prompt.

use redchat_types::chat::Turn;
use redchat_types::config::ServerConfig;
use redchat_types::llm::{CompletionRequest, Message};

/// Fixed system instruction shaping the assistant's tone and identity.
pub const PERSONA: &str = "You are an AI assistant called RED. \
Your name comes from the app's bold red visual theme, which represents speed, focus, and power. \
When users ask who you are or why you're called RED, say that you're RED, \
the AI assistant for this app, and your name reflects the app's fast, powerful red design. \
You are helpful, concise, and respond quickly. \
Use bullet points when explaining lists or steps. \
Keep responses under 300 words unless asked for more detail. \
Always be friendly and professional.";

/// Model parameters and limits used for every chat turn.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub title_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Prior turns forwarded to the model (most recent kept).
    pub history_window: usize,
    pub list_limit: u32,
}

impl From<&ServerConfig> for ChatSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            title_model: config.llm.title_model().to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            history_window: config.chat.history_window,
            list_limit: config.chat.list_limit,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Drop anything a client should not be able to put in a history:
/// system turns and blank turns.
pub fn sanitize_history(turns: Vec<Turn>) -> Vec<Turn> {
    turns.into_iter().filter(Turn::is_conversational).collect()
}

/// The trailing `window` turns of `history`.
fn recent(history: &[Turn], window: usize) -> &[Turn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Build the completion request for one turn.
pub fn build_request(settings: &ChatSettings, history: &[Turn], prompt: &str) -> CompletionRequest {
    let mut messages: Vec<Message> = recent(history, settings.history_window)
        .iter()
        .map(|turn| Message {
            role: turn.role,
            content: turn.content.clone(),
        })
        .collect();
    messages.push(Message::user(prompt));

    CompletionRequest {
        model: settings.model.clone(),
        messages,
        system: Some(PERSONA.to_string()),
        max_tokens: settings.max_tokens,
        temperature: Some(settings.temperature),
    }
}
