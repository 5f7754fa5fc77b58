//! Wiring from configuration to a ready orchestrator

use crate::agent::{AgentConfig, KeywordActionResolver, ToolAgent, ToolAgentFactory};
use crate::config::{AgentSettings, ConductorConfig};
use crate::dispatcher::ModeDispatcher;
use crate::error::Result;
use crate::orchestrator::TaskOrchestrator;
use crate::pipeline::MultiAgentPipeline;
use crate::registry::SpecializedAgentRegistry;
use conductor_llm::LlmProvider;
use conductor_tools::{register_builtins, RunnerConfig, ToolRegistry, ToolRunner};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the primary agent, falling back to an unrestricted agent when the
/// configured one is rejected
fn build_primary(factory: &ToolAgentFactory, config: &AgentConfig) -> Result<ToolAgent> {
    match factory.build(config) {
        Ok(agent) => Ok(agent),
        Err(e) => {
            warn!(error = %e, "Primary agent configuration rejected, using defaults");
            let name = if config.name.trim().is_empty() {
                AgentSettings::default().name
            } else {
                config.name.clone()
            };
            factory.build(&AgentConfig::new(name).with_max_iterations(config.max_iterations))
        }
    }
}

/// Build an orchestrator with the builtin tools
///
/// With `model` unset every agent runs on the keyword resolver alone.
/// Role overrides from the configuration are registered up front; one
/// that cannot be built is skipped with a warning and the role gets its
/// default agent on first use. A rejected primary configuration falls back
/// to an agent allowed every tool.
///
/// # Errors
/// Returns error only if even the fallback primary agent cannot be built
pub fn build_orchestrator(
    config: &ConductorConfig,
    model: Option<Arc<dyn LlmProvider>>,
) -> Result<TaskOrchestrator> {
    let mut tools = ToolRegistry::new();
    register_builtins(&mut tools);
    for name in &config.tools.disabled {
        if tools.disable(name) {
            info!(tool = %name, "Tool disabled by configuration");
        } else {
            warn!(tool = %name, "Cannot disable unknown tool");
        }
    }
    let runner = ToolRunner::new(Arc::new(tools), RunnerConfig::new(config.tool_timeout()));

    let resolver = Arc::new(KeywordActionResolver::new());
    let factory = ToolAgentFactory::new(runner.clone(), resolver.clone()).with_model(model);

    let primary = build_primary(&factory, &config.primary_agent())?;
    let tools = primary.config().tools.clone();

    let registry = Arc::new(SpecializedAgentRegistry::new(Arc::new(factory)));
    for (role, agent_config) in config.role_agents() {
        if let Err(e) = registry.register(role, &agent_config) {
            warn!(role = %role, error = %e, "Skipping role configuration, default agent will be used");
        }
    }

    let pipeline = MultiAgentPipeline::new(registry, resolver, runner);
    let dispatcher = ModeDispatcher::new(Arc::new(primary), pipeline)
        .with_threshold(config.complexity.threshold);

    info!(
        agent = %config.agent.name,
        threshold = %config.complexity.threshold,
        "Orchestrator ready"
    );

    Ok(TaskOrchestrator::new(Arc::new(dispatcher))
        .with_tools(tools)
        .with_default_mode(config.requested_mode()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DispatchMode;
    use crate::roles::Role;

    #[test]
    fn test_configured_roles_registered_up_front() {
        let config = ConductorConfig::from_yaml_str(
            "roles:\n  critic:\n    name: harsh-critic\n    tools: [text]\n",
        )
        .unwrap();

        let orchestrator = build_orchestrator(&config, None).unwrap();
        let registry = orchestrator.dispatcher().pipeline().registry();
        assert!(registry.contains(Role::Critic));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_config_answers_without_a_model() {
        let orchestrator = build_orchestrator(&ConductorConfig::default(), None).unwrap();

        let result = tokio_test::block_on(orchestrator.execute_task("calculate 6 * 7", None));
        assert_eq!(result.answer, "The result of 6 * 7 is 42");
        assert_eq!(orchestrator.history_len(), 1);
    }

    #[test]
    fn test_unbuildable_role_falls_back_to_default_agent() {
        let config =
            ConductorConfig::from_yaml_str("roles:\n  critic:\n    tools: [teleport]\n").unwrap();

        let orchestrator = build_orchestrator(&config, None).unwrap();
        let registry = orchestrator.dispatcher().pipeline().registry();
        assert!(!registry.contains(Role::Critic));

        let result = tokio_test::block_on(orchestrator.execute_task(
            "Compare and contrast the best options for each case, then evaluate all results",
            None,
        ));
        assert_eq!(result.mode, DispatchMode::Multi);
        assert!(result.stages[&Role::Critic].is_success());
        assert!(registry.contains(Role::Critic));
    }

    #[test]
    fn test_rejected_primary_config_uses_unrestricted_agent() {
        let config = ConductorConfig::from_yaml_str(
            "agent:\n  name: maestro\n  max_iterations: 3\n  tools: [calculator, teleport]\n",
        )
        .unwrap();

        let orchestrator = build_orchestrator(&config, None).unwrap();

        let result = tokio_test::block_on(orchestrator.execute_task("search for information", None));
        assert_eq!(result.mode, DispatchMode::Single);
        assert!(result.is_success());
        assert_eq!(result.answer, "Found 3 results for 'information'");
    }

    #[test]
    fn test_disabled_tool_is_refused() {
        let config =
            ConductorConfig::from_yaml_str("tools:\n  disabled: [search, teleport]\n").unwrap();

        let orchestrator = build_orchestrator(&config, None).unwrap();

        let result = tokio_test::block_on(orchestrator.execute_task("search for information", None));
        assert_eq!(result.mode, DispatchMode::Single);
        assert!(!result.is_success());
        assert!(result.outcome.unwrap().error.unwrap().contains("disabled"));
    }

    #[test]
    fn test_blank_primary_name_uses_default_name() {
        let factory = ToolAgentFactory::new(
            ToolRunner::with_defaults(Arc::new(ToolRegistry::new())),
            Arc::new(KeywordActionResolver::new()),
        );
        let agent = build_primary(&factory, &AgentConfig::new("  ")).unwrap();
        assert_eq!(agent.name(), "conductor");
        assert!(agent.config().tools.is_empty());
    }
}
