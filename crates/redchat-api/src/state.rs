//! Application state wiring the chat service to its backends.
//!
//! The service is generic over `ChatRepository`; AppState pins it to
//! `BoxChatRepository` so the storage backend (SQLite or in-process) is
//! chosen from configuration at startup.

use std::path::Path;
use std::sync::Arc;

use redchat_core::chat::box_repository::BoxChatRepository;
use redchat_core::chat::memory::InMemoryChatRepository;
use redchat_core::chat::prompt::ChatSettings;
use redchat_core::chat::service::ChatService;
use redchat_core::llm::box_provider::BoxLlmProvider;
use redchat_infra::config::{database_url, read_api_key};
use redchat_infra::llm::create_provider;
use redchat_infra::sqlite::chat::SqliteChatRepository;
use redchat_infra::sqlite::pool::DatabasePool;
use redchat_types::config::{ServerConfig, StorageBackend};

pub type ConcreteChatService = ChatService<BoxChatRepository>;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    /// Present only for the SQLite backend; closed on shutdown.
    pub db_pool: Option<DatabasePool>,
}

impl AppState {
    /// Initialize the application state: open storage, build the provider.
    ///
    /// A missing API key is not fatal: the server starts and chat endpoints
    /// answer 503 until one is configured.
    pub async fn init(config: &ServerConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let (repo, db_pool) = match config.storage.backend {
            StorageBackend::Sqlite => {
                if config.storage.database_url.is_none() {
                    tokio::fs::create_dir_all(data_dir).await?;
                }
                let url = database_url(&config.storage, data_dir);
                let pool = DatabasePool::new(&url).await?;
                tracing::info!(database = %url, "sqlite session store ready");
                (
                    BoxChatRepository::new(SqliteChatRepository::new(pool.clone())),
                    Some(pool),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("in-memory session store: sessions are lost on restart");
                (BoxChatRepository::new(InMemoryChatRepository::new()), None)
            }
        };

        let provider = match read_api_key(&config.llm) {
            Some(key) => Some(create_provider(&config.llm, Some(&key))?),
            None => {
                tracing::warn!(
                    env = %config.llm.api_key_env,
                    "API key not set; chat endpoints will return 503"
                );
                None
            }
        };

        Ok(Self::new(repo, provider, config, db_pool))
    }

    /// Assemble state from already-built parts.
    pub fn new(
        repo: BoxChatRepository,
        provider: Option<BoxLlmProvider>,
        config: &ServerConfig,
        db_pool: Option<DatabasePool>,
    ) -> Self {
        let settings = ChatSettings::from(config);
        Self {
            chat_service: Arc::new(ChatService::new(repo, provider, settings)),
            db_pool,
        }
    }
}
