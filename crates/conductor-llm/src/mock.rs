//! Mock LLM Provider for testing
//!
//! Replies are served from a queue; once it is empty a fixed default reply is
//! returned. Every request is recorded for later inspection.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Reply used when the queue is empty
pub const DEFAULT_MOCK_REPLY: &str = "mock response";

/// A mock LLM provider that returns queued responses or a default one.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider with pre-queued replies.
    #[must_use]
    pub fn with_responses(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let provider = Self::new();
        for response in responses {
            provider.add_response(response);
        }
        provider
    }

    /// Add a response to the queue.
    pub fn add_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response.into());
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let content = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| DEFAULT_MOCK_REPLY.to_string());

        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: "mock-model".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessageRole};

    #[tokio::test]
    async fn test_queued_then_default() {
        let provider = MockProvider::with_responses(["first"]);

        let first = provider.ask(vec![Message::user("a")], None).await.unwrap();
        assert_eq!(first.content, "first");

        let second = provider.ask(vec![Message::user("b")], None).await.unwrap();
        assert_eq!(second.content, DEFAULT_MOCK_REPLY);
    }

    #[tokio::test]
    async fn test_ask_prepends_system_message() {
        let provider = MockProvider::new();
        provider
            .ask(vec![Message::user("question")], Some("be brief"))
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "mock-model");
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
        assert_eq!(requests[0].messages[0].content, "be brief");
        assert_eq!(requests[0].messages[1].content, "question");
    }
}
