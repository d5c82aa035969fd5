//! Session title generation via LLM.
//!
//! `generate_title` asks the model for a title of at most five words based
//! on the user's first message. `title_for_first_turn` never fails: any
//! provider error or unusable output falls back to a truncated copy of the
//! message.

use redchat_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::box_provider::BoxLlmProvider;

/// Maximum number of words kept from a generated title.
pub const MAX_TITLE_WORDS: usize = 5;

/// Characters of the first message kept by the fallback title.
pub const FALLBACK_TITLE_CHARS: usize = 30;

/// System prompt for the title generation LLM call.
pub(crate) const TITLE_SYSTEM_PROMPT: &str = r#"Generate a short title (5 words or fewer) for a conversation that starts with the user's message below. The title should capture the main topic or intent. Return ONLY the title text, with no quotes and no trailing punctuation.

Examples:
- Debugging Rust lifetime errors
- Weekend trip to Tokyo
- Quantum computing basics"#;

/// Ask the model for a title for a conversation opening with `first_user_message`.
///
/// Low temperature (0.3) and a tiny token budget; the raw output is cleaned
/// with [`clean_title`]. Unusable output is reported as
/// [`LlmError::EmptyResponse`].
#[tracing::instrument(name = "generate_title", skip(provider, first_user_message), fields(model = %model))]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    first_user_message: &str,
    model: &str,
) -> Result<String, LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user(first_user_message)],
        system: Some(TITLE_SYSTEM_PROMPT.to_string()),
        max_tokens: 20,
        temperature: Some(0.3),
    };

    let response = provider.complete(&request).await?;
    clean_title(&response.content).ok_or(LlmError::EmptyResponse)
}

/// Title for a session's first turn; falls back on any failure.
pub async fn title_for_first_turn(
    provider: &BoxLlmProvider,
    first_user_message: &str,
    model: &str,
) -> String {
    match generate_title(provider, first_user_message, model).await {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!(error = %e, "title generation failed, using fallback");
            fallback_title(first_user_message)
        }
    }
}

/// Normalise model output into a title: strip whitespace, quotes, a
/// leading "Title:" label and trailing punctuation, then keep at most
/// [`MAX_TITLE_WORDS`] words.
pub fn clean_title(raw: &str) -> Option<String> {
    let first_line = raw.trim().lines().next().unwrap_or("").trim();
    let unlabeled = first_line
        .strip_prefix("Title:")
        .or_else(|| first_line.strip_prefix("title:"))
        .unwrap_or(first_line);
    let stripped = unlabeled
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*')
        .trim_end_matches(['.', '!', '?', ':', ';', ','])
        .trim();

    let words: Vec<&str> = stripped.split_whitespace().take(MAX_TITLE_WORDS).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Title derived from the message itself: the first
/// [`FALLBACK_TITLE_CHARS`] characters, with "..." when truncated.
pub fn fallback_title(first_user_message: &str) -> String {
    let collapsed = first_user_message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "New chat".to_string();
    }
    if collapsed.chars().count() <= FALLBACK_TITLE_CHARS {
        return collapsed;
    }
    let mut title: String = collapsed.chars().take(FALLBACK_TITLE_CHARS).collect();
    title.push_str("...");
    title
}
