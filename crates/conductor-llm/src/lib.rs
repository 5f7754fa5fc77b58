//! Conductor LLM - LLM Provider Abstraction
//!
//! This crate provides the model backends consumed by Conductor agents:
//! - Provider: the `LlmProvider` trait with the uniform `ask` entry point
//! - OpenAI: chat completions through async-openai
//! - Gemini: Google Gemini over the REST API
//! - Mock: queued replies for tests and offline runs
//! - Router: provider strategy table and named model registry

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod gemini;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod router;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
pub use router::{ModelConfig, ModelInfo, ModelRouter, ProviderConstructor};
