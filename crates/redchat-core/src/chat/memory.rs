//! Process-local chat repository.
//!
//! Backs the `memory` storage backend and the service/router tests. The
//! whole map sits behind one `RwLock`; `append_turns` holds the write lock
//! across the read-modify-write so appends are atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use redchat_types::chat::{ChatSession, ChatSummary};
use redchat_types::error::RepositoryError;

use super::repository::{ChatRepository, TurnAppend, apply_append};

type Key = (String, String);

#[derive(Default)]
pub struct InMemoryChatRepository {
    sessions: RwLock<HashMap<Key, ChatSession>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents across all users.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Query("session map lock poisoned".to_string())
}

fn key(user_id: &str, session_id: &str) -> Key {
    (user_id.to_string(), session_id.to_string())
}

impl ChatRepository for InMemoryChatRepository {
    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(&key(user_id, session_id)).cloned())
    }

    async fn append_turns(&self, append: &TurnAppend) -> Result<ChatSession, RepositoryError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let k = key(&append.user_id, &append.session_id);
        let updated = apply_append(sessions.remove(&k), append, Utc::now());
        sessions.insert(k, updated.clone());
        Ok(updated)
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        let mut summaries: Vec<ChatSummary> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .map(ChatSession::summary)
            .collect();
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        summaries.truncate(limit as usize);
        Ok(summaries)
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        Ok(sessions.remove(&key(user_id, session_id)).is_some())
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let before = sessions.len();
        sessions.retain(|(owner, _), _| owner != user_id);
        Ok((before - sessions.len()) as u64)
    }
}
