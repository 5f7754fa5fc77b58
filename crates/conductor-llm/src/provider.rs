//! LLM Provider trait definition
//!
//! Every backend implements `complete`; agents talk to backends through the
//! provided `ask` method so they never depend on request formatting.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use crate::message::Message;

/// Trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get available models
    fn available_models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Sampling temperature applied when a request leaves it unset
    fn temperature(&self) -> Option<f32> {
        None
    }

    /// Complete a conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Ask the model a question.
    ///
    /// The optional system message is placed ahead of `messages`.
    async fn ask(
        &self,
        messages: Vec<Message>,
        system_message: Option<&str>,
    ) -> Result<CompletionResponse> {
        let mut request = CompletionRequest::new(self.default_model());
        if let Some(system) = system_message {
            request = request.with_message(Message::system(system));
        }
        request = request.with_messages(messages);
        if let Some(temperature) = self.temperature() {
            request = request.with_temperature(temperature);
        }
        self.complete(request).await
    }
}
