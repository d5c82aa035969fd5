//! `redchat config`: print the effective configuration.

use std::path::Path;

use anyhow::Result;
use console::style;

use redchat_infra::config::{database_url, read_api_key};
use redchat_types::config::{ServerConfig, StorageBackend};

/// Display the configuration after file and environment overrides.
///
/// The API key is never printed, only whether its variable is set.
pub fn show_config(config: &ServerConfig, config_path: &Path, data_dir: &Path) -> Result<()> {
    let key_status = if read_api_key(&config.llm).is_some() {
        style("set").green()
    } else {
        style("not set").red()
    };

    println!();
    println!(
        "  {} redchat v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Files ──").dim());
    println!("  Config:   {}", config_path.display());
    println!("  Data dir: {}", data_dir.display());
    println!();

    println!("  {}", style("── Server ──").dim());
    println!(
        "  Listen:   {}",
        style(format!("{}:{}", config.server.host, config.server.port)).cyan()
    );
    println!();

    println!("  {}", style("── Provider ──").dim());
    println!("  Provider: {}", style(&config.llm.provider).bold());
    if let Some(base_url) = &config.llm.base_url {
        println!("  Base URL: {base_url}");
    }
    println!("  Model:    {}", config.llm.model);
    println!("  Titles:   {}", config.llm.title_model());
    println!(
        "  API key:  {} ({})",
        key_status,
        style(&config.llm.api_key_env).dim()
    );
    println!();

    println!("  {}", style("── Storage ──").dim());
    match config.storage.backend {
        StorageBackend::Sqlite => {
            println!("  Backend:  sqlite");
            println!("  Database: {}", database_url(&config.storage, data_dir));
        }
        StorageBackend::Memory => {
            println!("  Backend:  {}", style("memory (not persisted)").yellow());
        }
    }
    println!(
        "  History:  last {} turns, list limit {}",
        config.chat.history_window, config.chat.list_limit
    );
    println!();

    Ok(())
}
