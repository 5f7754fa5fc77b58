//! Error types for conductor-core
//!
//! This module provides error types and user-friendly error formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown role name
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Unknown mode name
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// Agent could not be built
    #[error("agent construction failed for {role}: {message}")]
    AgentConstruction {
        /// Role or agent name
        role: String,
        /// Detailed message
        message: String,
    },

    /// Execution failed
    #[error("execution error: {0}")]
    Execution(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] conductor_llm::Error),

    /// Tool execution error
    #[error("tool error: {0}")]
    Tool(#[from] conductor_tools::Error),

    /// Internal error (join failures, serialization)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { field, message } => {
                format!("⚙️ Configuration error in '{}': {}", field, message)
            }
            Error::Configuration(msg) => format!("⚙️ Configuration error: {}", msg),
            Error::UnknownRole(role) => format!("🎭 Unknown role '{}'.", role),
            Error::UnknownMode(mode) => format!("🔀 Unknown mode '{}'.", mode),
            Error::AgentConstruction { role, message } => {
                format!("🏗️ Could not create agent for {}: {}", role, message)
            }
            Error::Execution(msg) => format!("⚡ Execution failed: {}", msg),
            Error::Llm(conductor_llm::Error::NotConfigured(what)) => {
                format!("🔑 {} is not configured.", what)
            }
            Error::Llm(e) => format!("🤖 LLM error: {}", e),
            Error::Tool(e) => format!("🔧 Tool error: {}", e),
            Error::Internal(msg) => format!("❌ Internal error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfig { field, .. } => Some(format!(
                "💡 Check the '{}' setting in config.yaml or the CONDUCTOR_* environment variables.",
                field
            )),
            Error::Configuration(_) => {
                Some("💡 Check that config.yaml is valid YAML.".to_string())
            }
            Error::UnknownRole(_) => Some(
                "💡 Valid roles are researcher, planner, executor and critic.".to_string(),
            ),
            Error::UnknownMode(_) => Some("💡 Valid modes are single and multi.".to_string()),
            Error::Llm(conductor_llm::Error::NotConfigured(_)) => Some(
                "💡 Set OPENAI_API_KEY or GEMINI_API_KEY, or use the mock provider.".to_string(),
            ),
            Error::Llm(conductor_llm::Error::RateLimit) => {
                Some("💡 Try using a different model or wait before retrying.".to_string())
            }
            Error::Tool(_) | Error::Execution(_) => {
                Some("💡 Check the tool parameters and try again.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    output.push('\n');

    if let Some(suggestion) = error.suggestion() {
        output.push('\n');
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let error = Error::InvalidConfig {
            field: "complexity.threshold".to_string(),
            message: "must be non-negative".to_string(),
        };

        assert!(error.user_message().contains("complexity.threshold"));
        assert!(error.suggestion().unwrap().contains("config.yaml"));
    }

    #[test]
    fn test_llm_not_configured_suggestion() {
        let error: Error = conductor_llm::Error::NotConfigured("OPENAI_API_KEY".to_string()).into();

        assert!(error.user_message().contains("OPENAI_API_KEY"));
        assert!(error.suggestion().unwrap().contains("mock provider"));
    }

    #[test]
    fn test_format_error_for_cli() {
        let error = Error::UnknownMode("turbo".to_string());
        let output = format_error_for_cli(&error);

        assert!(output.contains("turbo"));
        assert!(output.contains("single and multi"));
    }

    #[test]
    fn test_internal_has_no_suggestion() {
        let error = Error::Internal("join failed".to_string());
        assert!(error.suggestion().is_none());
        assert_eq!(format_error_for_cli(&error), "❌ Internal error: join failed\n");
    }
}
