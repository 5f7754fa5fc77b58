//! Dispatch results

use crate::agent::AgentOutcome;
use crate::error::Error;
use crate::roles::Role;
use conductor_tools::ToolResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel answer when the executor produced nothing
pub const NO_ANSWER: &str = "No answer";

/// Path a task actually took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Arithmetic fast path
    Direct,
    /// Plain delegation to the primary agent
    Single,
    /// Four-role pipeline
    Multi,
}

impl DispatchMode {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Why a stage produced no outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    /// Failure message
    pub message: String,
}

impl StageFailure {
    /// Create a failure
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One role's run inside the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Role that ran
    pub role: Role,
    /// Prompt given to the role, verbatim
    pub prompt: String,
    /// Agent outcome, or the reason no agent could run
    pub outcome: std::result::Result<AgentOutcome, StageFailure>,
}

impl StageResult {
    /// Rendering threaded into the next role's prompt; `None` when the
    /// stage has no outcome
    #[must_use]
    pub fn rendered(&self) -> Option<String> {
        self.outcome.as_ref().ok().map(AgentOutcome::render)
    }

    /// Check whether the stage ran and succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.as_ref().is_ok_and(AgentOutcome::is_success)
    }
}

/// Result returned to the caller of a dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Original task
    pub task: String,
    /// Human-readable answer
    pub answer: String,
    /// Mode actually used
    pub mode: DispatchMode,
    /// Complexity score that chose the mode
    pub complexity: f64,
    /// Pipeline stages by role (multi mode)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stages: BTreeMap<Role, StageResult>,
    /// Primary agent outcome (single mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AgentOutcome>,
    /// Calculator result (direct mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_result: Option<ToolResult>,
}

impl AggregatedResult {
    /// Result of the single path; the outcome is kept verbatim
    #[must_use]
    pub fn single(task: impl Into<String>, outcome: AgentOutcome) -> Self {
        let answer = outcome
            .answer
            .clone()
            .unwrap_or_else(|| outcome.render());
        Self {
            task: task.into(),
            answer,
            mode: DispatchMode::Single,
            complexity: 0.0,
            stages: BTreeMap::new(),
            outcome: Some(outcome),
            direct_result: None,
        }
    }

    /// Result of the arithmetic fast path
    #[must_use]
    pub fn direct(task: impl Into<String>, expression: &str, result: ToolResult) -> Self {
        let value = result.result_text().unwrap_or_default();
        Self {
            task: task.into(),
            answer: format!("The result of {} is {}", expression, value),
            mode: DispatchMode::Direct,
            complexity: 0.0,
            stages: BTreeMap::new(),
            outcome: None,
            direct_result: Some(result),
        }
    }

    /// Result of the full pipeline
    ///
    /// The answer is the executor's answer, else the executor's rendered
    /// outcome, else [`NO_ANSWER`].
    #[must_use]
    pub fn multi(task: impl Into<String>, stages: BTreeMap<Role, StageResult>) -> Self {
        let answer = stages
            .get(&Role::Executor)
            .and_then(|stage| stage.outcome.as_ref().ok())
            .map(|outcome| outcome.answer.clone().unwrap_or_else(|| outcome.render()))
            .unwrap_or_else(|| NO_ANSWER.to_string());
        Self {
            task: task.into(),
            answer,
            mode: DispatchMode::Multi,
            complexity: 0.0,
            stages,
            outcome: None,
            direct_result: None,
        }
    }

    /// Result for a dispatch that never completed
    #[must_use]
    pub fn failed(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            answer: NO_ANSWER.to_string(),
            ..Self::single(task, AgentOutcome::error(message))
        }
    }

    /// Set the complexity score
    #[must_use]
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity;
        self
    }

    /// Check whether the dispatch succeeded
    ///
    /// Single mode follows the agent outcome, multi mode the executor stage.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self.mode {
            DispatchMode::Direct => true,
            DispatchMode::Single => self.outcome.as_ref().is_some_and(AgentOutcome::is_success),
            DispatchMode::Multi => self
                .stages
                .get(&Role::Executor)
                .is_some_and(StageResult::is_success),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(role: Role, outcome: std::result::Result<AgentOutcome, StageFailure>) -> StageResult {
        StageResult {
            role,
            prompt: role.prompt("t", None),
            outcome,
        }
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("MULTI".parse::<DispatchMode>().unwrap(), DispatchMode::Multi);
        assert_eq!(DispatchMode::Direct.to_string(), "direct");
        assert!("auto".parse::<DispatchMode>().is_err());
        assert_eq!(
            serde_json::to_string(&DispatchMode::Single).unwrap(),
            "\"single\""
        );
    }

    #[test]
    fn test_multi_answer_prefers_executor_answer() {
        let mut stages = BTreeMap::new();
        stages.insert(
            Role::Executor,
            stage(
                Role::Executor,
                Ok(AgentOutcome::success(serde_json::json!({}), Some("42".to_string()))),
            ),
        );
        let result = AggregatedResult::multi("t", stages);
        assert_eq!(result.answer, "42");
        assert!(result.is_success());
    }

    #[test]
    fn test_multi_answer_falls_back_to_rendering() {
        let outcome = AgentOutcome::error("boom");
        let mut stages = BTreeMap::new();
        stages.insert(Role::Executor, stage(Role::Executor, Ok(outcome.clone())));
        let result = AggregatedResult::multi("t", stages);
        assert_eq!(result.answer, outcome.render());
        assert!(!result.is_success());
    }

    #[test]
    fn test_multi_without_executor_outcome() {
        let mut stages = BTreeMap::new();
        stages.insert(
            Role::Executor,
            stage(Role::Executor, Err(StageFailure::new("no agent"))),
        );
        let result = AggregatedResult::multi("t", stages);
        assert_eq!(result.answer, NO_ANSWER);
        assert!(result.stages[&Role::Executor].rendered().is_none());
    }

    #[test]
    fn test_direct_answer() {
        let tool_result = ToolResult::success(serde_json::json!({"result": "4"}), 0);
        let result = AggregatedResult::direct("calculate 2 + 2", "2 + 2", tool_result);
        assert_eq!(result.mode, DispatchMode::Direct);
        assert_eq!(result.answer, "The result of 2 + 2 is 4");
    }

    #[test]
    fn test_failed() {
        let result = AggregatedResult::failed("t", "task panicked");
        assert_eq!(result.answer, NO_ANSWER);
        assert!(!result.is_success());
    }
}
