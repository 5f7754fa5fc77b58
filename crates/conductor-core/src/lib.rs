//! Conductor Core - Dispatch and Coordination
//!
//! This crate decides how a task runs and runs it:
//! - Complexity: heuristic task scoring
//! - Dispatcher: single agent below the threshold, pipeline above it
//! - Pipeline: researcher → planner → executor → critic with handoff
//! - Registry: one lazily built agent per role
//! - Orchestrator: off-thread dispatch plus execution history
//! - Config: YAML + environment configuration with default fallback

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod bootstrap;
pub mod complexity;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod result;
pub mod roles;

pub use agent::{
    Action, ActionResolver, AgentConfig, AgentFactory, AgentOutcome, CapabilityAgent,
    DispatchOptions, KeywordActionResolver, OutcomeStatus, ToolAgent, ToolAgentFactory,
};
pub use bootstrap::build_orchestrator;
pub use complexity::{score, ComplexityReport};
pub use config::ConductorConfig;
pub use dispatcher::ModeDispatcher;
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use orchestrator::{HistoryEntry, HistoryStatus, TaskOrchestrator};
pub use pipeline::MultiAgentPipeline;
pub use registry::SpecializedAgentRegistry;
pub use result::{AggregatedResult, DispatchMode, StageFailure, StageResult, NO_ANSWER};
pub use roles::Role;
