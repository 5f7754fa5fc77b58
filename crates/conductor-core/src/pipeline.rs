//! Multi-agent pipeline
//!
//! Runs researcher, planner, executor and critic in order, feeding each
//! stage's rendered outcome into the next prompt. No stage failure stops
//! the pipeline. Tasks starting with "calculate" first try the calculator
//! directly.

use crate::agent::{Action, ActionResolver, AgentOutcome, CapabilityAgent, DispatchOptions};
use crate::registry::SpecializedAgentRegistry;
use crate::result::{AggregatedResult, StageFailure, StageResult};
use crate::roles::Role;
use conductor_tools::ToolRunner;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const FAST_PATH_PREFIX: &str = "calculate";

/// Fixed four-role pipeline with an arithmetic fast path
pub struct MultiAgentPipeline {
    registry: Arc<SpecializedAgentRegistry>,
    resolver: Arc<dyn ActionResolver>,
    runner: ToolRunner,
}

impl MultiAgentPipeline {
    /// Create a pipeline
    #[must_use]
    pub fn new(
        registry: Arc<SpecializedAgentRegistry>,
        resolver: Arc<dyn ActionResolver>,
        runner: ToolRunner,
    ) -> Self {
        Self {
            registry,
            resolver,
            runner,
        }
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &Arc<SpecializedAgentRegistry> {
        &self.registry
    }

    /// Run a task through the pipeline
    #[instrument(skip(self, options))]
    pub async fn run(&self, task: &str, options: &DispatchOptions) -> AggregatedResult {
        info!("Expanding to multi-agent mode");

        if let Some(direct) = self.fast_path(task).await {
            info!(answer = %direct.answer, "Answered by direct calculation");
            return direct;
        }

        let mut agents: BTreeMap<Role, Result<Arc<dyn CapabilityAgent>, StageFailure>> =
            BTreeMap::new();
        for role in Role::ORDER {
            let agent = self.registry.resolve(role, &options.tools).map_err(|e| {
                warn!(role = %role, error = %e, "Could not resolve agent");
                StageFailure::new(e.to_string())
            });
            agents.insert(role, agent);
        }

        let mut stages: BTreeMap<Role, StageResult> = BTreeMap::new();
        for (role, agent) in agents {
            let upstream = role
                .upstream()
                .and_then(|up| stages.get(&up))
                .and_then(StageResult::rendered);
            let prompt = role.prompt(task, upstream.as_deref());

            let outcome = match agent {
                Ok(agent) => Ok(match agent.execute(&prompt, options).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(role = %role, error = %e, "Agent failed");
                        AgentOutcome::error(e.to_string())
                    }
                }),
                Err(failure) => Err(failure),
            };
            debug!(role = %role, ok = outcome.as_ref().is_ok_and(AgentOutcome::is_success), "Stage finished");

            stages.insert(
                role,
                StageResult {
                    role,
                    prompt,
                    outcome,
                },
            );
        }

        info!(stages = stages.len(), "All agents finished, aggregating results");
        AggregatedResult::multi(task, stages)
    }

    async fn fast_path(&self, task: &str) -> Option<AggregatedResult> {
        if !task.trim_start().to_lowercase().starts_with(FAST_PATH_PREFIX) {
            return None;
        }

        let Action { name, input } = self.resolver.resolve(task);
        if name != "calculator" {
            return None;
        }
        let expression = input.get("expression")?.as_str()?.to_string();

        match self.runner.execute(&name, input).await {
            Ok(executed) if executed.result.success && executed.result.result_text().is_some() => {
                Some(AggregatedResult::direct(task, &expression, executed.result))
            }
            Ok(executed) => {
                debug!(error = ?executed.result.error, "Direct calculation failed, running pipeline");
                None
            }
            Err(e) => {
                debug!(error = %e, "Direct calculation unavailable, running pipeline");
                None
            }
        }
    }
}
