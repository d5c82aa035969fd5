//! LLM provider implementations.
//!
//! Provides a provider factory ([`create_provider`]) that builds the
//! configured OpenAI-compatible provider, and a connection test
//! ([`test_provider_connection`]) used by `redchat check`.

pub mod openai_compat;

use secrecy::{ExposeSecret, SecretString};

use redchat_core::llm::box_provider::BoxLlmProvider;
use redchat_types::config::LlmConfig;
use redchat_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, known_base_url};

/// Create a [`BoxLlmProvider`] from the `[llm]` configuration.
///
/// `base_url` wins when set; otherwise the URL is inferred from the provider
/// name, defaulting to OpenAI's endpoint for unknown names.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<&SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key
        .map(|k| SecretString::from(k.expose_secret().to_string()))
        .ok_or(LlmError::AuthenticationFailed)?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenAiCompatibleProvider::new(OpenAiCompatConfig {
            provider_name: config.provider.clone(),
            base_url: base_url.to_string(),
            api_key: key,
            model: config.model.clone(),
        }),
        None => match config.provider.as_str() {
            "groq" => OpenAiCompatibleProvider::groq(key, &config.model),
            "openai" => OpenAiCompatibleProvider::openai(key, &config.model),
            other => {
                tracing::warn!(
                    provider = other,
                    "unknown provider without base_url, using the OpenAI endpoint"
                );
                OpenAiCompatibleProvider::openai(key, &config.model)
            }
        },
    };

    tracing::debug!(
        provider = %config.provider,
        base_url = config.base_url.as_deref().or(known_base_url(&config.provider)),
        model = %config.model,
        "completion provider ready"
    );
    Ok(BoxLlmProvider::new(provider))
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Sends a tiny "Hello" message with a minimal token budget against the
/// provider's configured default model.
pub async fn test_provider_connection(
    provider: &BoxLlmProvider,
) -> Result<CompletionResponse, LlmError> {
    let request = CompletionRequest {
        model: String::new(), // Provider uses its configured default
        messages: vec![Message::user("Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
    };
    provider.complete(&request).await
}
