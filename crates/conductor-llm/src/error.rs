//! Error types for conductor-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Unknown provider identifier
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Model construction failed
    #[error("failed to create model: {0}")]
    Construction(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
