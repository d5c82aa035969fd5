//! Configuration types and per-provider defaults for OpenAI-compatible providers.
//!
//! Each well-known provider that speaks the OpenAI chat completions protocol
//! gets a factory function returning an [`OpenAiCompatConfig`] with the
//! correct base URL.

use secrecy::SecretString;

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// OpenAI's public endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "groq", "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.groq.com/openai/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model, used when a request leaves `model` empty.
    pub model: String,
}

/// Groq default configuration.
pub fn groq_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "groq".into(),
        base_url: GROQ_BASE_URL.into(),
        api_key,
        model: model.into(),
    }
}

/// OpenAI default configuration.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
    }
}

/// Base URL for a well-known provider name.
pub fn known_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "groq" => Some(GROQ_BASE_URL),
        "openai" => Some(OPENAI_BASE_URL),
        _ => None,
    }
}
