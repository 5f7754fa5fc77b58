//! Mode dispatcher
//!
//! Scores a task and routes it to the primary agent (below the threshold)
//! or to the multi-agent pipeline.

use crate::agent::{AgentOutcome, CapabilityAgent, DispatchOptions, OutcomeStatus};
use crate::complexity::{self, DEFAULT_THRESHOLD};
use crate::error::{Error, Result};
use crate::pipeline::MultiAgentPipeline;
use crate::result::AggregatedResult;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Chooses between the single agent and the pipeline
pub struct ModeDispatcher {
    primary: Arc<dyn CapabilityAgent>,
    pipeline: MultiAgentPipeline,
    threshold: f64,
}

impl ModeDispatcher {
    /// Create a dispatcher with the default threshold
    #[must_use]
    pub fn new(primary: Arc<dyn CapabilityAgent>, pipeline: MultiAgentPipeline) -> Self {
        Self {
            primary,
            pipeline,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Set the complexity threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Get the complexity threshold
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Get the pipeline
    #[must_use]
    pub fn pipeline(&self) -> &MultiAgentPipeline {
        &self.pipeline
    }

    /// Score a task and run it on the chosen path
    #[instrument(skip(self, options))]
    pub async fn dispatch(&self, task: &str, options: &DispatchOptions) -> AggregatedResult {
        let complexity = complexity::score(task);

        if complexity < self.threshold {
            info!(
                complexity = %format!("{:.1}", complexity),
                threshold = %self.threshold,
                "Task complexity below threshold, staying in single-agent mode"
            );
            info!("Delegating task to the primary agent");
            let outcome = match self.primary.execute(task, options).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Primary agent failed");
                    AgentOutcome::error(e.to_string())
                }
            };
            return AggregatedResult::single(task, outcome).with_complexity(complexity);
        }

        info!(
            complexity = %format!("{:.1}", complexity),
            threshold = %self.threshold,
            "Task complexity above threshold, expanding to multi-agent mode"
        );
        info!("Decomposing task across specialized agents");
        self.pipeline
            .run(task, options)
            .await
            .with_complexity(complexity)
    }
}

#[async_trait::async_trait]
impl CapabilityAgent for ModeDispatcher {
    async fn execute(&self, task: &str, options: &DispatchOptions) -> Result<AgentOutcome> {
        let result = self.dispatch(task, options).await;
        let success = result.is_success();
        let answer = result.answer.clone();
        let payload =
            serde_json::to_value(&result).map_err(|e| Error::Internal(e.to_string()))?;

        let mut outcome = AgentOutcome::success(payload, Some(answer));
        if !success {
            outcome.status = OutcomeStatus::Error;
            outcome.error = Some(format!("{} dispatch did not succeed", result.mode));
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{KeywordActionResolver, MockAgentFactory, MockCapabilityAgent};
    use crate::registry::SpecializedAgentRegistry;
    use crate::result::DispatchMode;
    use conductor_tools::{register_builtins, ToolRegistry, ToolRunner};

    fn pipeline(factory: MockAgentFactory) -> MultiAgentPipeline {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        MultiAgentPipeline::new(
            Arc::new(SpecializedAgentRegistry::new(Arc::new(factory))),
            Arc::new(KeywordActionResolver::new()),
            ToolRunner::with_defaults(Arc::new(registry)),
        )
    }

    fn answering_primary(answer: &'static str) -> Arc<dyn CapabilityAgent> {
        let mut primary = MockCapabilityAgent::new();
        primary.expect_execute().times(1).returning(move |_, _| {
            Ok(AgentOutcome::success(serde_json::json!({}), Some(answer.to_string())))
        });
        Arc::new(primary)
    }

    #[tokio::test]
    async fn test_simple_task_goes_single() {
        let mut factory = MockAgentFactory::new();
        factory.expect_create().never();
        let dispatcher = ModeDispatcher::new(answering_primary("found it"), pipeline(factory));

        let result = dispatcher
            .dispatch("search for information", &DispatchOptions::default())
            .await;

        assert_eq!(result.mode, DispatchMode::Single);
        assert_eq!(result.answer, "found it");
        assert!((result.complexity - 2.8).abs() < 1e-9);
        assert!(dispatcher.pipeline().registry().is_empty());
    }

    #[tokio::test]
    async fn test_score_exactly_at_threshold_goes_multi() {
        let mut factory = MockAgentFactory::new();
        factory.expect_create().times(4).returning(|_| {
            let mut agent = MockCapabilityAgent::new();
            agent
                .expect_execute()
                .returning(|_, _| Ok(AgentOutcome::success(serde_json::json!({}), None)));
            Ok(Arc::new(agent) as Arc<dyn CapabilityAgent>)
        });
        let primary = MockCapabilityAgent::new();
        let dispatcher = ModeDispatcher::new(Arc::new(primary), pipeline(factory));

        // one search verb, five words, one category
        let result = dispatcher
            .dispatch("search a b c d", &DispatchOptions::default())
            .await;

        assert_eq!(result.complexity, 3.0);
        assert_eq!(result.mode, DispatchMode::Multi);
        assert_eq!(result.stages.len(), 4);
    }

    #[tokio::test]
    async fn test_score_just_below_threshold_stays_single() {
        let mut factory = MockAgentFactory::new();
        factory.expect_create().never();
        let dispatcher = ModeDispatcher::new(answering_primary("ok"), pipeline(factory));

        let result = dispatcher
            .dispatch("search a b c", &DispatchOptions::default())
            .await;

        assert!(result.complexity < 3.0);
        assert!((result.complexity - 2.9).abs() < 1e-9);
        assert_eq!(result.mode, DispatchMode::Single);
    }

    #[tokio::test]
    async fn test_requested_mode_does_not_override_score() {
        let dispatcher =
            ModeDispatcher::new(answering_primary("ok"), pipeline(MockAgentFactory::new()));
        let options = DispatchOptions::new().with_requested_mode(DispatchMode::Multi);

        let result = dispatcher.dispatch("search for information", &options).await;
        assert_eq!(result.mode, DispatchMode::Single);
    }

    #[tokio::test]
    async fn test_threshold_is_tunable() {
        let dispatcher =
            ModeDispatcher::new(answering_primary("ok"), pipeline(MockAgentFactory::new()))
                .with_threshold(3.5);

        let result = dispatcher
            .dispatch("calculate 2 + 2", &DispatchOptions::default())
            .await;
        assert_eq!(result.mode, DispatchMode::Single);
    }

    #[tokio::test]
    async fn test_primary_error_becomes_error_outcome() {
        let mut primary = MockCapabilityAgent::new();
        primary
            .expect_execute()
            .returning(|_, _| Err(Error::Execution("offline".to_string())));
        let dispatcher = ModeDispatcher::new(Arc::new(primary), pipeline(MockAgentFactory::new()));

        let result = dispatcher.dispatch("hello", &DispatchOptions::default()).await;
        assert!(!result.is_success());
        assert!(result.outcome.unwrap().error.unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_dispatcher_as_agent() {
        let dispatcher = ModeDispatcher::new(
            Arc::new(MockCapabilityAgent::new()),
            pipeline(MockAgentFactory::new()),
        );

        let outcome = dispatcher
            .execute("calculate 2 + 2", &DispatchOptions::default())
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.answer.as_deref(), Some("The result of 2 + 2 is 4"));
        assert_eq!(outcome.result["mode"], "direct");
    }
}
