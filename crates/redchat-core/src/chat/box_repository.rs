//! BoxChatRepository -- object-safe wrapper so the store backend can be
//! chosen at runtime (SQLite or in-process) behind one concrete type.
//!
//! Same blanket-impl pattern as [`crate::llm::box_provider::BoxLlmProvider`].

use std::future::Future;
use std::pin::Pin;

use redchat_types::chat::{ChatSession, ChatSummary};
use redchat_types::error::RepositoryError;

use super::repository::{ChatRepository, TurnAppend};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`ChatRepository`] with boxed futures.
pub trait ChatRepositoryDyn: Send + Sync {
    fn get_session_boxed<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Option<ChatSession>>;

    fn append_turns_boxed<'a>(&'a self, append: &'a TurnAppend) -> BoxFuture<'a, ChatSession>;

    fn list_sessions_boxed<'a>(
        &'a self,
        user_id: &'a str,
        limit: u32,
    ) -> BoxFuture<'a, Vec<ChatSummary>>;

    fn delete_session_boxed<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, bool>;

    fn delete_all_boxed<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, u64>;
}

impl<T: ChatRepository> ChatRepositoryDyn for T {
    fn get_session_boxed<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Option<ChatSession>> {
        Box::pin(self.get_session(user_id, session_id))
    }

    fn append_turns_boxed<'a>(&'a self, append: &'a TurnAppend) -> BoxFuture<'a, ChatSession> {
        Box::pin(self.append_turns(append))
    }

    fn list_sessions_boxed<'a>(
        &'a self,
        user_id: &'a str,
        limit: u32,
    ) -> BoxFuture<'a, Vec<ChatSummary>> {
        Box::pin(self.list_sessions(user_id, limit))
    }

    fn delete_session_boxed<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, bool> {
        Box::pin(self.delete_session(user_id, session_id))
    }

    fn delete_all_boxed<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, u64> {
        Box::pin(self.delete_all(user_id))
    }
}

/// Type-erased chat repository.
pub struct BoxChatRepository {
    inner: Box<dyn ChatRepositoryDyn>,
}

impl BoxChatRepository {
    pub fn new<T: ChatRepository + 'static>(repo: T) -> Self {
        Self {
            inner: Box::new(repo),
        }
    }
}

impl ChatRepository for BoxChatRepository {
    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        self.inner.get_session_boxed(user_id, session_id).await
    }

    async fn append_turns(&self, append: &TurnAppend) -> Result<ChatSession, RepositoryError> {
        self.inner.append_turns_boxed(append).await
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        self.inner.list_sessions_boxed(user_id, limit).await
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete_session_boxed(user_id, session_id).await
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, RepositoryError> {
        self.inner.delete_all_boxed(user_id).await
    }
}
