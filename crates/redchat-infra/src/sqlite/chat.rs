//! SQLite chat session document store.
//!
//! Implements `ChatRepository` from `redchat-core`. Each session is one row
//! keyed by `(user_id, session_id)`; the turns live in a JSON array column.
//! Appends read and rewrite the row inside a transaction on the
//! single-connection writer pool, so concurrent appends serialize.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use redchat_core::chat::repository::{ChatRepository, TurnAppend, apply_append};
use redchat_types::chat::{ChatSession, ChatSummary, Turn};
use redchat_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

const SESSION_COLUMNS: &str =
    "user_id, session_id, title, messages, preview, created_at, updated_at";

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    user_id: String,
    session_id: String,
    title: String,
    messages: String,
    preview: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            session_id: row.try_get("session_id")?,
            title: row.try_get("title")?,
            messages: row.try_get("messages")?,
            preview: row.try_get("preview")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let messages: Vec<Turn> = serde_json::from_str(&self.messages).map_err(|e| {
            RepositoryError::Corrupt(format!("session {}: messages: {e}", self.session_id))
        })?;

        Ok(ChatSession {
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            user_id: self.user_id,
            session_id: self.session_id,
            title: self.title,
            messages,
            preview: self.preview,
        })
    }
}

/// Internal row type for session listings (turn bodies are not loaded).
struct ChatSummaryRow {
    session_id: String,
    title: String,
    preview: String,
    message_count: i64,
    created_at: String,
    updated_at: String,
}

impl ChatSummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            title: row.try_get("title")?,
            preview: row.try_get("preview")?,
            message_count: row.try_get("message_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_summary(self) -> Result<ChatSummary, RepositoryError> {
        Ok(ChatSummary {
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            session_id: self.session_id,
            title: self.title,
            preview: self.preview,
            message_count: self.message_count as u32,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so `ORDER BY updated_at` sorts chronologically.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE user_id = ? AND session_id = ?"
        ))
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn append_turns(&self, append: &TurnAppend) -> Result<ChatSession, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let existing = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE user_id = ? AND session_id = ?"
        ))
        .bind(&append.user_id)
        .bind(&append.session_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?
        .map(|row| {
            ChatSessionRow::from_row(&row)
                .map_err(query_err)
                .and_then(ChatSessionRow::into_session)
        })
        .transpose()?;

        // Stored timestamps carry microseconds; the returned document must match.
        let session = apply_append(existing, append, Utc::now().trunc_subsecs(6));
        let messages = serde_json::to_string(&session.messages)
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO chat_sessions (user_id, session_id, title, messages, preview, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (user_id, session_id) DO UPDATE SET
                   messages = excluded.messages,
                   preview = excluded.preview,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&session.user_id)
        .bind(&session.session_id)
        .bind(&session.title)
        .bind(&messages)
        .bind(&session.preview)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        Ok(session)
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT session_id, title, preview, json_array_length(messages) AS message_count,
                      created_at, updated_at
               FROM chat_sessions
               WHERE user_id = ?
               ORDER BY updated_at DESC, session_id ASC
               LIMIT ?"#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary_row = ChatSummaryRow::from_row(row).map_err(query_err)?;
            summaries.push(summary_row.into_summary()?);
        }

        Ok(summaries)
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE user_id = ? AND session_id = ?")
            .bind(user_id)
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use redchat_core::chat::prompt::ChatSettings;
    use redchat_core::chat::service::{ChatService, TurnRequest};
    use redchat_core::llm::box_provider::BoxLlmProvider;
    use redchat_core::llm::testing::ScriptedProvider;
    use redchat_types::chat::MessageRole;
    use redchat_types::config::ServerConfig;

    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn append(user: &str, session: &str, prompt: &str) -> TurnAppend {
        TurnAppend {
            user_id: user.to_string(),
            session_id: session.to_string(),
            turns: vec![Turn::user(prompt), Turn::assistant(format!("re: {prompt}"))],
            title: format!("Title for {prompt}"),
            preview: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_creates_then_extends() {
        let repo = SqliteChatRepository::new(test_pool().await);

        let created = repo.append_turns(&append("alice", "s1", "first")).await.unwrap();
        assert_eq!(created.messages.len(), 2);
        assert_eq!(created.title, "Title for first");

        let updated = repo.append_turns(&append("alice", "s1", "second")).await.unwrap();
        assert_eq!(updated.title, "Title for first");
        assert_eq!(updated.preview, "second");
        assert_eq!(updated.created_at, created.created_at);

        let stored = repo.get_session("alice", "s1").await.unwrap().unwrap();
        assert_eq!(stored.created_at, updated.created_at);
        assert_eq!(stored.updated_at, updated.updated_at);
        let contents: Vec<&str> = stored.messages.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["first", "re: first", "second", "re: second"]);
        assert_eq!(stored.title, "Title for first");
    }

    #[tokio::test]
    async fn test_returned_document_matches_stored_row() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let returned = repo.append_turns(&append("alice", "s1", "hi")).await.unwrap();
        let stored = repo.get_session("alice", "s1").await.unwrap().unwrap();

        assert_eq!(returned.created_at, stored.created_at);
        assert_eq!(returned.updated_at, stored.updated_at);
        assert_eq!(returned.updated_at.timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(returned.messages, stored.messages);
    }

    #[tokio::test]
    async fn test_chat_service_over_sqlite() {
        let provider = ScriptedProvider::with_title("Paris.", "Capital Cities");
        let service = ChatService::new(
            SqliteChatRepository::new(test_pool().await),
            Some(BoxLlmProvider::new(provider.clone())),
            ChatSettings::from(&ServerConfig::default()),
        );
        let turn = |prompt: &str, incognito: bool| TurnRequest {
            user_id: "alice".to_string(),
            session_id: Some("s1".to_string()),
            prompt: prompt.to_string(),
            incognito,
            client_history: Vec::new(),
        };

        let first = service.send_turn(turn("Capital of France?", false)).await.unwrap();
        assert_eq!(first.chat_title.as_deref(), Some("Capital Cities"));
        let second = service.send_turn(turn("And Germany?", false)).await.unwrap();
        assert_eq!(second.chat_title.as_deref(), Some("Capital Cities"));

        let history = service.get_history("alice", "s1").await.unwrap();
        let roles: Vec<MessageRole> = history.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            [
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );

        // Incognito turns neither read nor write the store.
        let mut secret = turn("secret", true);
        secret.session_id = Some("hidden".to_string());
        service.send_turn(secret).await.unwrap();
        assert!(service.get_history("alice", "hidden").await.unwrap().is_empty());
        assert_eq!(service.get_history("alice", "s1").await.unwrap().len(), 4);
        assert_eq!(service.list_sessions("alice", None).await.unwrap().len(), 1);

        service.delete_session("alice", "s1").await.unwrap();
        assert!(service.get_history("alice", "s1").await.unwrap().is_empty());
        assert!(service.list_sessions("alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_and_other_user() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.append_turns(&append("alice", "s1", "hi")).await.unwrap();

        assert!(repo.get_session("alice", "nope").await.unwrap().is_none());
        assert!(repo.get_session("bob", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sessions_order_limit_and_count() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.append_turns(&append("alice", "older", "a")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.append_turns(&append("alice", "newer", "b")).await.unwrap();
        repo.append_turns(&append("alice", "newer", "c")).await.unwrap();
        repo.append_turns(&append("bob", "hidden", "d")).await.unwrap();

        let list = repo.list_sessions("alice", 50).await.unwrap();
        let ids: Vec<&str> = list.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, ["newer", "older"]);
        assert_eq!(list[0].message_count, 4);
        assert_eq!(list[0].preview, "c");

        let limited = repo.list_sessions("alice", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].session_id, "newer");
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.append_turns(&append("alice", "s1", "hi")).await.unwrap();

        assert!(!repo.delete_session("bob", "s1").await.unwrap());
        assert!(repo.delete_session("alice", "s1").await.unwrap());
        assert!(!repo.delete_session("alice", "s1").await.unwrap());
        assert!(repo.get_session("alice", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_scoped_to_user() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.append_turns(&append("alice", "a", "1")).await.unwrap();
        repo.append_turns(&append("alice", "b", "2")).await.unwrap();
        repo.append_turns(&append("bob", "c", "3")).await.unwrap();

        assert_eq!(repo.delete_all("alice").await.unwrap(), 2);
        assert!(repo.list_sessions("alice", 50).await.unwrap().is_empty());
        assert_eq!(repo.list_sessions("bob", 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_every_turn() {
        let repo = Arc::new(SqliteChatRepository::new(test_pool().await));
        let mut handles = Vec::new();
        for i in 0..12 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.append_turns(&append("alice", "shared", &format!("p{i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.get_session("alice", "shared").await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 24);
        // Every user turn is immediately followed by its own reply.
        for pair in stored.messages.chunks(2) {
            assert_eq!(pair[1].content, format!("re: {}", pair[0].content));
        }
    }

    #[tokio::test]
    async fn test_corrupt_messages_column_is_reported() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO chat_sessions (user_id, session_id, title, messages, preview, created_at, updated_at)
             VALUES ('alice', 'bad', 't', '{\"not\":\"a list\"}', '', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        let repo = SqliteChatRepository::new(pool);
        let err = repo.get_session("alice", "bad").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_datetime(&dt), "2024-05-01T10:00:00.000000Z");
        assert_eq!(parse_datetime(&format_datetime(&dt)).unwrap(), dt);
    }
}
