//! Runner - Tool execution engine
//!
//! Looks tools up by name, checks the caller's allow-list, validates input
//! and runs the tool under a timeout.

use crate::error::{Error, Result};
use crate::registry::{ToolRegistry, ToolResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

/// Configuration for the tool runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Default timeout for tool execution
    pub default_timeout: Duration,
    /// Maximum timeout allowed
    pub max_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            max_timeout: Duration::from_secs(300),
        }
    }
}

impl RunnerConfig {
    /// Create a new configuration with default timeout
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            ..Default::default()
        }
    }
}

/// Options for a single tool execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Custom timeout for this execution
    pub timeout: Option<Duration>,
    /// Tool names the caller may use; empty allows every registered tool
    pub allowed_tools: Vec<String>,
}

impl ExecutionOptions {
    /// Create options with a specific timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Restrict execution to the given tool names
    #[must_use]
    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    fn allows(&self, tool_name: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool_name)
    }
}

/// Tool execution result with additional metadata
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The tool result
    pub result: ToolResult,
    /// Tool name
    pub tool_name: String,
}

/// Tool runner for executing registered tools
#[derive(Clone)]
pub struct ToolRunner {
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl ToolRunner {
    /// Create a new tool runner
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, RunnerConfig::default())
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute a tool by name
    ///
    /// # Errors
    /// See [`ToolRunner::execute_with_options`]
    pub async fn execute(
        &self,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ExecutionResult> {
        self.execute_with_options(tool_name, input, ExecutionOptions::default())
            .await
    }

    /// Execute a tool with custom options
    ///
    /// A tool that returns an error is reported as a failed [`ToolResult`];
    /// lookup, permission, validation and timeout problems are returned as
    /// errors.
    ///
    /// # Errors
    /// Returns error if the tool is unknown, disabled, not allowed, given
    /// invalid input, or exceeds its timeout
    #[instrument(skip(self, input, options), fields(tool = %tool_name))]
    pub async fn execute_with_options(
        &self,
        tool_name: &str,
        input: serde_json::Value,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| Error::NotFound(tool_name.to_string()))?;

        if !self.registry.is_enabled(tool_name) {
            return Err(Error::PermissionDenied(format!(
                "Tool '{}' is disabled",
                tool_name
            )));
        }

        if !options.allows(tool_name) {
            warn!(tool = %tool_name, "Tool outside allow-list");
            return Err(Error::PermissionDenied(format!(
                "Tool '{}' is not available to this agent",
                tool_name
            )));
        }

        tool.validate_input(&input)?;

        let execution_timeout = options
            .timeout
            .unwrap_or(self.config.default_timeout)
            .min(self.config.max_timeout);

        let start = Instant::now();
        debug!(tool = %tool_name, timeout_ms = %execution_timeout.as_millis(), "Executing tool");

        let result = match timeout(execution_timeout, tool.execute(input)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let duration = start.elapsed().as_millis() as u64;
                error!(tool = %tool_name, error = %e, "Tool execution failed");
                ToolResult::failure(e.to_string(), duration)
            }
            Err(_) => {
                let duration = start.elapsed().as_millis() as u64;
                warn!(tool = %tool_name, timeout_ms = %execution_timeout.as_millis(), "Tool execution timed out");
                return Err(Error::Timeout(duration));
            }
        };

        debug!(
            tool = %tool_name,
            success = %result.success,
            duration_ms = %result.duration_ms,
            "Tool execution completed"
        );

        Ok(ExecutionResult {
            result,
            tool_name: tool_name.to_string(),
        })
    }
}
