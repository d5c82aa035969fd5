//! Chat turn and session document types for redchat.
//!
//! A session is stored as one document keyed by `(user_id, session_id)`
//! holding the title, the ordered turns, and a short preview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::llm::MessageRole;

/// User id applied when a request carries no identity header.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Maximum preview length in characters (before the ellipsis).
pub const PREVIEW_CHARS: usize = 80;

/// One side of an exchange: a user prompt or an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Only user and assistant turns with visible content belong in a history.
    pub fn is_conversational(&self) -> bool {
        self.role != MessageRole::System && !self.content.trim().is_empty()
    }
}

/// A stored conversation thread owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub user_id: String,
    pub session_id: String,
    pub title: String,
    pub messages: Vec<Turn>,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Listing projection of this document.
    pub fn summary(&self) -> ChatSummary {
        ChatSummary {
            session_id: self.session_id.clone(),
            title: self.title.clone(),
            preview: self.preview.clone(),
            message_count: self.messages.len() as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row returned by session listings (no turn bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub session_id: String,
    pub title: String,
    pub preview: String,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mint an id for a session the client did not name.
pub fn new_session_id() -> String {
    Uuid::now_v7().to_string()
}

/// Build the listing preview from the latest user prompt.
pub fn make_preview(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
