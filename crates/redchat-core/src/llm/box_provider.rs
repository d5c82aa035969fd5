//! Type-erased completion provider.
//!
//! `LlmProvider` returns `impl Future`, so it cannot be a trait object. The
//! provider is picked from configuration at startup, which needs one
//! concrete type: [`BoxLlmProvider`] boxes any provider behind
//! [`LlmProviderDyn`], whose futures are pinned boxes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use redchat_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Dyn-compatible mirror of [`LlmProvider`].
pub trait LlmProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl<T: LlmProvider> LlmProviderDyn for T {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn complete_boxed<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// The provider chat turns, titles and voice translation are sent to.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn>,
}

impl BoxLlmProvider {
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use redchat_types::llm::Message;

    #[tokio::test]
    async fn test_box_provider_delegates() {
        let scripted = ScriptedProvider::replying("pong");
        let boxed = BoxLlmProvider::new(scripted.clone());
        assert_eq!(boxed.name(), "scripted");
        assert_eq!(format!("{boxed:?}"), r#"BoxLlmProvider { name: "scripted" }"#);

        let request = CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![Message::user("ping")],
            system: None,
            max_tokens: 16,
            temperature: None,
        };
        let response = boxed.complete(&request).await.unwrap();
        assert_eq!(response.content, "pong");
        assert_eq!(response.model, "test-model");
        assert_eq!(scripted.calls(), 1);
    }
}
