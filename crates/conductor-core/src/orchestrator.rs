//! Task orchestrator
//!
//! Front door for callers: each task is handed to the dispatcher through its
//! [`CapabilityAgent`] interface on a spawned tokio task, awaited, and
//! appended to an in-memory history. History is unbounded for the life of
//! the process.

use crate::agent::{AgentOutcome, CapabilityAgent, DispatchOptions};
use crate::dispatcher::ModeDispatcher;
use crate::result::{AggregatedResult, DispatchMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Final status of a recorded task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    /// Dispatch succeeded
    Completed,
    /// Dispatch produced an error result
    Failed,
}

/// One recorded task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry id
    pub id: Uuid,
    /// Task text
    pub task: String,
    /// Mode the caller asked for
    pub requested_mode: Option<DispatchMode>,
    /// Mode actually used
    pub mode: DispatchMode,
    /// When dispatch started
    pub start_time: DateTime<Utc>,
    /// Wall-clock seconds spent
    pub execution_time: f64,
    /// Final status
    pub status: HistoryStatus,
    /// Full result
    pub result: AggregatedResult,
}

/// Accepts tasks, dispatches them and keeps history
pub struct TaskOrchestrator {
    dispatcher: Arc<ModeDispatcher>,
    tools: Vec<String>,
    default_mode: Option<DispatchMode>,
    history: RwLock<Vec<HistoryEntry>>,
    last_result: RwLock<Option<AggregatedResult>>,
}

impl TaskOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(dispatcher: Arc<ModeDispatcher>) -> Self {
        Self {
            dispatcher,
            tools: Vec::new(),
            default_mode: None,
            history: RwLock::new(Vec::new()),
            last_result: RwLock::new(None),
        }
    }

    /// Tool list handed to default role agents
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Mode recorded when a call does not name one
    #[must_use]
    pub fn with_default_mode(mut self, mode: Option<DispatchMode>) -> Self {
        self.default_mode = mode;
        self
    }

    /// Get the dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<ModeDispatcher> {
        &self.dispatcher
    }

    /// Run a task and record it
    ///
    /// Always returns a result; a dispatch that panics is reported as a
    /// failed result.
    #[instrument(skip(self))]
    pub async fn execute_task(&self, task: &str, mode: Option<DispatchMode>) -> AggregatedResult {
        let requested_mode = mode.or(self.default_mode);
        let options = DispatchOptions {
            tools: self.tools.clone(),
            requested_mode,
        };

        let start_time = Utc::now();
        let started = Instant::now();

        let agent: Arc<dyn CapabilityAgent> = self.dispatcher.clone();
        let owned_task = task.to_string();
        let handle = tokio::spawn(async move { agent.execute(&owned_task, &options).await });

        let result = match handle.await {
            Ok(Ok(outcome)) => unpack(task, outcome),
            Ok(Err(e)) => {
                error!(error = %e, "Dispatch failed");
                AggregatedResult::failed(task, e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Dispatch task did not complete");
                AggregatedResult::failed(task, format!("dispatch aborted: {}", e))
            }
        };

        let execution_time = started.elapsed().as_secs_f64();
        let status = if result.is_success() {
            HistoryStatus::Completed
        } else {
            HistoryStatus::Failed
        };
        info!(
            mode = %result.mode,
            status = ?status,
            execution_time = %format!("{:.3}s", execution_time),
            "Task finished"
        );

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            task: task.to_string(),
            requested_mode,
            mode: result.mode,
            start_time,
            execution_time,
            status,
            result: result.clone(),
        };

        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
        *self.last_result.write().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());

        result
    }

    /// Snapshot of the history, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of recorded tasks
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Most recent result
    #[must_use]
    pub fn last_result(&self) -> Option<AggregatedResult> {
        self.last_result
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Recover the aggregated result carried in an outcome payload; an agent
/// that reports something else is treated as a single-agent answer
fn unpack(task: &str, outcome: AgentOutcome) -> AggregatedResult {
    match serde_json::from_value::<AggregatedResult>(outcome.result.clone()) {
        Ok(result) => result,
        Err(e) => {
            debug!(error = %e, "Outcome carries no aggregated result");
            AggregatedResult::single(task, outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{KeywordActionResolver, MockAgentFactory, MockCapabilityAgent};
    use crate::error::Result;
    use crate::pipeline::MultiAgentPipeline;
    use crate::registry::SpecializedAgentRegistry;
    use conductor_tools::{register_builtins, ToolRegistry, ToolRunner};

    fn orchestrator(primary: Arc<dyn CapabilityAgent>) -> TaskOrchestrator {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let pipeline = MultiAgentPipeline::new(
            Arc::new(SpecializedAgentRegistry::new(Arc::new(MockAgentFactory::new()))),
            Arc::new(KeywordActionResolver::new()),
            ToolRunner::with_defaults(Arc::new(registry)),
        );
        TaskOrchestrator::new(Arc::new(ModeDispatcher::new(primary, pipeline)))
    }

    #[tokio::test]
    async fn test_history_records_each_call_in_order() {
        let mut primary = MockCapabilityAgent::new();
        primary
            .expect_execute()
            .returning(|task, _| {
                Ok(AgentOutcome::success(
                    serde_json::json!({}),
                    Some(task.to_uppercase()),
                ))
            });
        let orchestrator =
            orchestrator(Arc::new(primary)).with_default_mode(Some(DispatchMode::Single));

        orchestrator.execute_task("hello", None).await;
        orchestrator.execute_task("calculate 2 + 2", Some(DispatchMode::Multi)).await;
        orchestrator.execute_task("bye", None).await;

        let history = orchestrator.history();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|e| e.task.as_str()).collect::<Vec<_>>(),
            vec!["hello", "calculate 2 + 2", "bye"]
        );
        assert!(history.iter().all(|e| e.execution_time >= 0.0));
        assert_eq!(history[0].requested_mode, Some(DispatchMode::Single));
        assert_eq!(history[1].requested_mode, Some(DispatchMode::Multi));
        assert_eq!(history[1].mode, DispatchMode::Direct);
        assert!(history.iter().all(|e| e.status == HistoryStatus::Completed));

        assert_eq!(orchestrator.last_result().unwrap().answer, "BYE");
    }

    #[tokio::test]
    async fn test_failed_dispatch_is_recorded() {
        let mut primary = MockCapabilityAgent::new();
        primary
            .expect_execute()
            .returning(|_, _| Ok(AgentOutcome::error("nope")));
        let orchestrator = orchestrator(Arc::new(primary));

        let result = orchestrator.execute_task("hello", None).await;
        assert!(!result.is_success());
        assert_eq!(orchestrator.history()[0].status, HistoryStatus::Failed);
    }

    #[test]
    fn test_unpack_plain_outcome_as_single() {
        let outcome = AgentOutcome::success(serde_json::json!({"steps": []}), Some("done".to_string()));
        let result = unpack("hello", outcome.clone());
        assert_eq!(result.mode, DispatchMode::Single);
        assert_eq!(result.answer, "done");
        assert_eq!(result.outcome, Some(outcome));
    }

    #[test]
    fn test_unpack_round_trips_aggregated_result() {
        let original = AggregatedResult::failed("hello", "boom").with_complexity(1.5);
        let outcome = AgentOutcome::success(serde_json::to_value(&original).unwrap(), None);
        assert_eq!(unpack("hello", outcome), original);
    }

    struct ExplodingAgent;

    #[async_trait::async_trait]
    impl CapabilityAgent for ExplodingAgent {
        async fn execute(&self, _task: &str, _options: &DispatchOptions) -> Result<AgentOutcome> {
            panic!("agent exploded");
        }
    }

    #[tokio::test]
    async fn test_panicking_dispatch_becomes_failed_result() {
        let orchestrator = orchestrator(Arc::new(ExplodingAgent));

        let result = orchestrator.execute_task("hello", None).await;
        assert_eq!(result.answer, crate::result::NO_ANSWER);
        assert!(!result.is_success());
        assert_eq!(orchestrator.history_len(), 1);
    }
}
