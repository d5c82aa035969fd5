//! `redchat check`: verify the provider answers a minimal completion.

use std::time::Instant;

use anyhow::{Result, bail};
use console::style;

use redchat_infra::config::read_api_key;
use redchat_infra::llm::{create_provider, test_provider_connection};
use redchat_types::config::ServerConfig;

pub async fn check_provider(config: &ServerConfig) -> Result<()> {
    let Some(key) = read_api_key(&config.llm) else {
        println!(
            "  {} {} is not set",
            style("✗").red(),
            style(&config.llm.api_key_env).bold()
        );
        bail!("no API key configured");
    };

    let provider = create_provider(&config.llm, Some(&key))?;

    println!();
    println!(
        "  Checking {} with model {}...",
        style(&config.llm.provider).cyan(),
        style(&config.llm.model).cyan()
    );

    let started = Instant::now();
    match test_provider_connection(&provider).await {
        Ok(response) => {
            println!(
                "  {} Connected in {}ms ({} in / {} out tokens, model {})",
                style("✓").green(),
                started.elapsed().as_millis(),
                response.usage.input_tokens,
                response.usage.output_tokens,
                response.model
            );
            println!();
            Ok(())
        }
        Err(e) => {
            println!("  {} {}", style("✗").red(), e);
            println!();
            Err(e.into())
        }
    }
}
