//! ChatRepository trait definition.
//!
//! Sessions are whole documents keyed by `(user_id, session_id)`. Writes go
//! through [`ChatRepository::append_turns`], which implementations must
//! perform as one atomic read-modify-write so concurrent turns on the same
//! session never overwrite each other.

use chrono::{DateTime, Utc};
use redchat_types::chat::{ChatSession, ChatSummary, Turn};
use redchat_types::error::RepositoryError;

/// Turns to append to a session, plus the document fields used if the
/// session does not exist yet.
#[derive(Debug, Clone)]
pub struct TurnAppend {
    pub user_id: String,
    pub session_id: String,
    /// Appended in order after any stored turns.
    pub turns: Vec<Turn>,
    /// Only written when the document is created; an existing title is kept.
    pub title: String,
    /// Replaces the stored preview.
    pub preview: String,
}

/// Merge an append into the stored document (or start a new one).
///
/// Shared by every implementation so the title-once and append-only rules
/// live in one place.
pub fn apply_append(
    existing: Option<ChatSession>,
    append: &TurnAppend,
    now: DateTime<Utc>,
) -> ChatSession {
    let mut session = existing.unwrap_or_else(|| ChatSession {
        user_id: append.user_id.clone(),
        session_id: append.session_id.clone(),
        title: append.title.clone(),
        messages: Vec::new(),
        preview: String::new(),
        created_at: now,
        updated_at: now,
    });

    session.messages.extend(append.turns.iter().cloned());
    session.preview = append.preview.clone();
    session.updated_at = now;
    session
}

/// Repository trait for chat session documents.
///
/// Implementations live in redchat-infra (`SqliteChatRepository`) and in
/// this crate ([`super::memory::InMemoryChatRepository`]).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Fetch one session document.
    fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Atomically append turns, creating the document when missing.
    ///
    /// Returns the document as stored after the append.
    fn append_turns(
        &self,
        append: &TurnAppend,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// List a user's sessions, most recently updated first.
    fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSummary>, RepositoryError>> + Send;

    /// Delete one session. Returns whether a document was removed.
    fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every session owned by a user. Returns the number removed.
    fn delete_all(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
