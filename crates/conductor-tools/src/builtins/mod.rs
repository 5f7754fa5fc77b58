//! Builtins - Built-in tools for Conductor
//!
//! - calculator: arithmetic expression evaluation
//! - search: offline search stub
//! - text: counting and case transforms
//! - dummy_action: no-op fallback

mod calculator;
mod dummy_action;
mod search;
mod text;

pub use calculator::{evaluate, format_number, CalculatorTool};
pub use dummy_action::DummyActionTool;
pub use search::SearchTool;
pub use text::{TextOperation, TextTool};

use crate::registry::ToolRegistry;
use std::sync::Arc;

/// Register all built-in tools with the registry
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(CalculatorTool::new()));
    registry.register(Arc::new(SearchTool::new()));
    registry.register(Arc::new(TextTool::new()));
    registry.register(Arc::new(DummyActionTool::new()));
}
