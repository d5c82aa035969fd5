//! Dictated-text processing for the voice endpoint.
//!
//! Speech-to-text output arrives unpunctuated and with stray whitespace.
//! [`normalize_transcript`] tidies it locally; translation into a target
//! language is a completion request built by [`translation_request`].

use redchat_types::error::ChatError;
use redchat_types::llm::{CompletionRequest, Message};

/// Longest accepted language tag or name (e.g. "pt-BR", "Brazilian Portuguese").
const MAX_LANG_LEN: usize = 35;

/// Collapse whitespace, capitalise the first letter and close the sentence.
pub fn normalize_transcript(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    if out.chars().last().is_some_and(char::is_alphanumeric) {
        out.push('.');
    }
    out
}

/// Interpret the requested target language.
///
/// Absent, blank and `auto` mean "no translation". Anything else must look
/// like a language tag or name.
pub fn parse_target_lang(target_lang: Option<&str>) -> Result<Option<String>, ChatError> {
    let lang = match target_lang.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(l) if l.eq_ignore_ascii_case("auto") => return Ok(None),
        Some(l) => l,
    };

    let valid = lang.len() <= MAX_LANG_LEN
        && lang
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '_' || c == ' ');
    if !valid {
        return Err(ChatError::Invalid(format!("unsupported target_lang: '{lang}'")));
    }
    Ok(Some(lang.to_string()))
}

/// Completion request translating `text` into `target_lang`.
pub fn translation_request(text: &str, target_lang: &str, model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user(text)],
        system: Some(format!(
            "Translate the user's message into {target_lang}. \
             Return ONLY the translated text, with no notes or quotes."
        )),
        max_tokens: 1000,
        temperature: Some(0.2),
    }
}
