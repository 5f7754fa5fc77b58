//! Conductor Tools - Tool Registry and Execution Engine
//!
//! This crate provides the tools agents call into:
//! - Registry: Tool registration and discovery
//! - Runner: Tool execution with timeouts and input validation
//! - Builtins: calculator, search, text, dummy_action

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod registry;
pub mod runner;

pub use builtins::register_builtins;
pub use error::{Error, Result};
pub use registry::{Tool, ToolCategory, ToolDefinition, ToolRegistry, ToolResult};
pub use runner::{ExecutionOptions, ExecutionResult, RunnerConfig, ToolRunner};
