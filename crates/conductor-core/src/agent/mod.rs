//! Agents
//!
//! - [`CapabilityAgent`]: the `execute(task, options)` seam used by the
//!   single path and by every pipeline role
//! - [`ToolAgent`]: model-guided tool loop with a keyword fallback
//! - [`ActionResolver`]: maps a task to one tool call
//! - [`AgentFactory`]: builds agents from an [`AgentConfig`]

mod factory;
mod resolver;
mod tool_agent;

pub use factory::{AgentFactory, ToolAgentFactory};
pub use resolver::{Action, ActionResolver, KeywordActionResolver};
pub use tool_agent::{Step, ToolAgent};

#[cfg(test)]
pub use factory::MockAgentFactory;

use crate::error::Result;
use crate::result::DispatchMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upper bound on model-guided steps
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Outcome status reported by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The agent finished
    Success,
    /// The agent failed
    Error,
}

/// What an agent returns for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Success or error
    pub status: OutcomeStatus,
    /// Structured payload
    pub result: serde_json::Value,
    /// Human-readable answer, when the agent produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Error message for failed outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentOutcome {
    /// Create a successful outcome
    #[must_use]
    pub fn success(result: serde_json::Value, answer: Option<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            result,
            answer,
            error: None,
        }
    }

    /// Create a failed outcome
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            result: serde_json::Value::Null,
            answer: None,
            error: Some(message.into()),
        }
    }

    /// Check whether the outcome succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Compact JSON rendering, as threaded into downstream prompts
    #[must_use]
    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Options passed through dispatch to agents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOptions {
    /// Tool list given to default role agents
    #[serde(default)]
    pub tools: Vec<String>,
    /// Mode the caller asked for; recorded, never overrides the score
    #[serde(default)]
    pub requested_mode: Option<DispatchMode>,
}

impl DispatchOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default tool list
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Record a requested mode
    #[must_use]
    pub fn with_requested_mode(mut self, mode: DispatchMode) -> Self {
        self.requested_mode = Some(mode);
        self
    }
}

/// Agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name
    pub name: String,
    /// Tools the agent may use; empty allows every registered tool
    #[serde(default)]
    pub tools: Vec<String>,
    /// Upper bound on model-guided steps
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Extra instructions placed ahead of the tool listing
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl AgentConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
        }
    }

    /// Set the allowed tools
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the iteration limit
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set extra system instructions
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// An agent that executes a task and reports an outcome
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CapabilityAgent: Send + Sync {
    /// Execute a task
    async fn execute(&self, task: &str, options: &DispatchOptions) -> Result<AgentOutcome>;
}
