//! Server configuration types for redchat.
//!
//! `ServerConfig` represents the top-level `config.toml`. Every field has a
//! default so an empty or missing file yields a runnable server.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the redchat server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name; well-known names ("groq", "openai") imply a base URL.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Override the provider's base URL (any OpenAI-compatible endpoint).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for title generation; falls back to `model`.
    #[serde(default)]
    pub title_model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_model() -> String {
    "llama-3.1-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl LlmConfig {
    pub fn title_model(&self) -> &str {
        self.title_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            title_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Conversation assembly and listing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of most recent prior turns forwarded to the model.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Default maximum number of sessions returned by a listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
}

fn default_history_window() -> usize {
    20
}

fn default_list_limit() -> u32 {
    50
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            list_limit: default_list_limit(),
        }
    }
}

/// Where session documents live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Process-local; contents are lost on restart.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite URL; defaults to `{data_dir}/redchat.db`.
    #[serde(default)]
    pub database_url: Option<String>,
}
