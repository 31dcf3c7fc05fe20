//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// Mock backend for testing.
///
/// Returns a configured structured object (or none) and records every
/// request it receives.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    response_content: String,
    structured: Option<serde_json::Value>,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            response_content: String::new(),
            structured: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Set the structured object returned by the forced function call.
    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.structured = Some(value);
        self
    }

    /// Set free-text response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// The most recent request passed to complete.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        // Estimate token counts
        let prompt_tokens = request
            .system_prompt
            .as_deref()
            .map_or(0, |s| s.len() as u32 / 4)
            + request
                .messages
                .iter()
                .map(|m| m.content.len() as u32 / 4)
                .sum::<u32>();

        let completion_tokens = self
            .structured
            .as_ref()
            .map_or(self.response_content.len(), |v| v.to_string().len()) as u32
            / 4;

        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }

        Ok(CompletionResponse {
            content: self.response_content.clone(),
            structured: self.structured.clone(),
            finish_reason: if self.structured.is_some() {
                FinishReason::ToolCalls
            } else {
                FinishReason::Stop
            },
            usage: Usage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }
}
