//! Scripted in-process provider for tests.
//!
//! Responses come from a closure over the incoming request, so a test can
//! answer title requests and chat requests differently, fail selectively,
//! and inspect every request that reached the "API".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use redchat_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::provider::LlmProvider;
use crate::chat::title::TITLE_SYSTEM_PROMPT;

type Responder = dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync;

/// Provider whose replies are computed by a closure. Clones share counters.
#[derive(Clone)]
pub struct ScriptedProvider {
    responder: Arc<Responder>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with the same text.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Answer title requests with `title` and everything else with `reply`.
    pub fn with_title(reply: &str, title: &str) -> Self {
        let reply = reply.to_string();
        let title = title.to_string();
        Self::new(move |req| {
            if is_title_request(req) {
                Ok(title.clone())
            } else {
                Ok(reply.clone())
            }
        })
    }

    /// Number of completion calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests that were not title-generation calls.
    pub fn chat_requests(&self) -> Vec<CompletionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !is_title_request(r))
            .collect()
    }
}

/// Whether a request was issued by the title generator.
pub fn is_title_request(request: &CompletionRequest) -> bool {
    request.system.as_deref() == Some(TITLE_SYSTEM_PROMPT)
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let content = (self.responder)(request)?;
        Ok(CompletionResponse {
            id: format!("scripted-{}", self.calls()),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}
