//! Specialized agent registry
//!
//! One agent per [`Role`], built on first use unless registered explicitly.
//! Resolution goes through the map's entry API, so concurrent first uses of
//! a role build a single instance.

use crate::agent::{AgentConfig, AgentFactory, CapabilityAgent};
use crate::error::Result;
use crate::roles::Role;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// Lazily populated Role → agent cache
pub struct SpecializedAgentRegistry {
    agents: DashMap<Role, Arc<dyn CapabilityAgent>>,
    factory: Arc<dyn AgentFactory>,
}

impl SpecializedAgentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            agents: DashMap::new(),
            factory,
        }
    }

    /// Build an agent for a role now, replacing any cached instance
    ///
    /// # Errors
    /// Returns error if the factory rejects the configuration
    pub fn register(&self, role: Role, config: &AgentConfig) -> Result<()> {
        let agent = self.factory.create(config)?;
        self.agents.insert(role, agent);
        info!(role = %role, agent = %config.name, "Added specialized agent");
        Ok(())
    }

    /// Get the agent for a role, building a default one on first use
    ///
    /// The default agent is named `<role>-agent` and gets `tools`.
    ///
    /// # Errors
    /// Returns error if the default agent cannot be built
    pub fn resolve(&self, role: Role, tools: &[String]) -> Result<Arc<dyn CapabilityAgent>> {
        let entry = self.agents.entry(role).or_try_insert_with(|| {
            let config = AgentConfig::new(role.default_agent_name()).with_tools(tools.to_vec());
            let agent = self.factory.create(&config)?;
            info!(role = %role, agent = %config.name, "Added specialized agent");
            Ok::<_, crate::error::Error>(agent)
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Check whether a role has an agent
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.agents.contains_key(&role)
    }

    /// Number of roles with an agent
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check whether no role has an agent yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
