//! Configuration loader for redchat.
//!
//! Reads `config.toml` from the data directory (`~/.redchat/` by default)
//! into [`ServerConfig`], falling back to defaults when the file is missing
//! or malformed. Environment overrides are applied on top, and the provider
//! API key is read from the environment variable the config names.

use std::path::{Path, PathBuf};

use redchat_types::config::{LlmConfig, ServerConfig, StorageConfig};
use secrecy::SecretString;

use crate::sqlite::pool::default_database_url;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "REDCHAT_DATA_DIR";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory: `REDCHAT_DATA_DIR`, else `~/.redchat`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".redchat"),
    }
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`ServerConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(path: &Path) -> ServerConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

/// Apply environment overrides: `PORT`, `REDCHAT_HOST`, `REDCHAT_MODEL`,
/// `REDCHAT_DATABASE_URL`.
///
/// `lookup` abstracts the environment so callers can pass
/// `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(port) = get("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!(value = %port, "ignoring invalid PORT"),
        }
    }
    if let Some(host) = get("REDCHAT_HOST") {
        config.server.host = host;
    }
    if let Some(model) = get("REDCHAT_MODEL") {
        config.llm.model = model;
    }
    if let Some(url) = get("REDCHAT_DATABASE_URL") {
        config.storage.database_url = Some(url);
    }
}

/// Effective SQLite URL: the configured one, else `{data_dir}/redchat.db`.
pub fn database_url(storage: &StorageConfig, data_dir: &Path) -> String {
    storage
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// Read the provider API key from the variable named by `api_key_env`.
///
/// Blank values count as absent.
pub fn api_key_from<F>(config: &LlmConfig, lookup: F) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&config.api_key_env)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// [`api_key_from`] against the process environment.
pub fn read_api_key(config: &LlmConfig) -> Option<SecretString> {
    api_key_from(config, |k| std::env::var(k).ok())
}
