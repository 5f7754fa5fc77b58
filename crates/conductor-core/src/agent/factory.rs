//! Agent construction

use super::resolver::ActionResolver;
use super::{AgentConfig, CapabilityAgent, ToolAgent};
use crate::error::{Error, Result};
use conductor_llm::LlmProvider;
use conductor_tools::ToolRunner;
use std::sync::Arc;
use tracing::debug;

/// Builds agents from configuration
#[cfg_attr(test, mockall::automock)]
pub trait AgentFactory: Send + Sync {
    /// Build a new agent instance
    ///
    /// # Errors
    /// Returns error if the configuration cannot produce an agent
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn CapabilityAgent>>;
}

/// Factory producing [`ToolAgent`]s that share one runner, resolver and model
#[derive(Clone)]
pub struct ToolAgentFactory {
    runner: ToolRunner,
    resolver: Arc<dyn ActionResolver>,
    model: Option<Arc<dyn LlmProvider>>,
}

impl ToolAgentFactory {
    /// Create a factory without a model
    #[must_use]
    pub fn new(runner: ToolRunner, resolver: Arc<dyn ActionResolver>) -> Self {
        Self {
            runner,
            resolver,
            model: None,
        }
    }

    /// Give every built agent this model
    #[must_use]
    pub fn with_model(mut self, model: Option<Arc<dyn LlmProvider>>) -> Self {
        self.model = model;
        self
    }

    /// Build a concrete [`ToolAgent`]
    ///
    /// # Errors
    /// Returns error if the name is blank or a listed tool is not registered
    pub fn build(&self, config: &AgentConfig) -> Result<ToolAgent> {
        if config.name.trim().is_empty() {
            return Err(Error::AgentConstruction {
                role: "(unnamed)".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }
        if let Some(missing) = config
            .tools
            .iter()
            .find(|tool| !self.runner.registry().has(tool))
        {
            return Err(Error::AgentConstruction {
                role: config.name.clone(),
                message: format!("unknown tool '{}'", missing),
            });
        }

        debug!(agent = %config.name, tools = ?config.tools, "Building tool agent");
        let agent = ToolAgent::new(config.clone(), self.runner.clone(), Arc::clone(&self.resolver));
        Ok(match &self.model {
            Some(model) => agent.with_model(Arc::clone(model)),
            None => agent,
        })
    }
}

impl AgentFactory for ToolAgentFactory {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn CapabilityAgent>> {
        Ok(Arc::new(self.build(config)?))
    }
}
