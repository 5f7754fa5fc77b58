//! Pipeline roles and their prompts

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed role in the multi-agent pipeline
///
/// Ordering follows pipeline order, so ordered maps keyed by `Role` iterate
/// researcher, planner, executor, critic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Gathers information
    Researcher,
    /// Drafts a strategy from the research
    Planner,
    /// Carries out the plan
    Executor,
    /// Reviews the executor's output
    Critic,
}

impl Role {
    /// Pipeline order
    pub const ORDER: [Role; 4] = [Role::Researcher, Role::Planner, Role::Executor, Role::Critic];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Researcher => "researcher",
            Self::Planner => "planner",
            Self::Executor => "executor",
            Self::Critic => "critic",
        }
    }

    /// Name given to a default agent for this role
    #[must_use]
    pub fn default_agent_name(&self) -> String {
        format!("{}-agent", self.as_str())
    }

    /// Role whose output feeds this one
    #[must_use]
    pub fn upstream(&self) -> Option<Role> {
        match self {
            Self::Researcher => None,
            Self::Planner => Some(Self::Researcher),
            Self::Executor => Some(Self::Planner),
            Self::Critic => Some(Self::Executor),
        }
    }

    /// Build the prompt for this role
    ///
    /// `upstream` is the rendered output of [`Role::upstream`]; a missing
    /// result renders as `None`.
    #[must_use]
    pub fn prompt(&self, task: &str, upstream: Option<&str>) -> String {
        let upstream = upstream.unwrap_or("None");
        match self {
            Self::Researcher => format!("Analyze and gather information for: {}", task),
            Self::Planner => format!(
                "Plan execution strategy for: {}\nBased on research: {}",
                task, upstream
            ),
            Self::Executor => format!(
                "Execute plan for: {}\nFollowing strategy: {}",
                task, upstream
            ),
            Self::Critic => format!(
                "Evaluate results for: {}\nAnalyzing output: {}",
                task, upstream
            ),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "researcher" => Ok(Self::Researcher),
            "planner" => Ok(Self::Planner),
            "executor" => Ok(Self::Executor),
            "critic" => Ok(Self::Critic),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_ord() {
        let mut sorted = Role::ORDER;
        sorted.sort();
        assert_eq!(sorted, Role::ORDER);
    }

    #[test]
    fn test_upstream_chain() {
        assert_eq!(Role::Researcher.upstream(), None);
        assert_eq!(Role::Critic.upstream(), Some(Role::Executor));
    }

    #[test]
    fn test_prompts() {
        assert_eq!(
            Role::Researcher.prompt("t", Some("ignored")),
            "Analyze and gather information for: t"
        );
        assert_eq!(
            Role::Planner.prompt("t", Some("{\"status\":\"success\"}")),
            "Plan execution strategy for: t\nBased on research: {\"status\":\"success\"}"
        );
        assert_eq!(
            Role::Critic.prompt("t", None),
            "Evaluate results for: t\nAnalyzing output: None"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("Planner".parse::<Role>().unwrap(), Role::Planner);
        assert_eq!(Role::Executor.default_agent_name(), "executor-agent");
        assert!(matches!("judge".parse::<Role>(), Err(Error::UnknownRole(_))));
    }
}
