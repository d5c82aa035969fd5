//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! multi-connection reader pool for listings and history fetches with a
//! single-connection writer pool. Every session append runs as a transaction
//! on that one writer connection, which is what makes appends atomic.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Session store connections: `reader` (8 read-only connections) and
/// `writer` (exactly one connection, owns the migrations).
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools and run migrations on the writer.
    ///
    /// The database must be file-backed: an in-memory URL would give the
    /// reader and writer two unrelated databases.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await?;

        // Schema must exist before the read-only pool connects.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(base_opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

/// Default database URL for a data directory: `{data_dir}/redchat.db`.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/redchat.db?mode=rwc", data_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(dir: &tempfile::TempDir) -> DatabasePool {
        DatabasePool::new(&default_database_url(dir.path()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_create_session_table() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, ["chat_sessions"]);
    }

    #[tokio::test]
    async fn test_writer_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_reader_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let result = sqlx::query("DELETE FROM chat_sessions")
            .execute(&pool.reader)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_default_database_url() {
        let url = default_database_url(Path::new("/tmp/redchat"));
        assert_eq!(url, "sqlite:///tmp/redchat/redchat.db?mode=rwc");
    }
}
