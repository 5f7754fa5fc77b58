//! Fallback tool used when no other tool matches a task

use crate::error::Result;
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};

/// Reply carried by every dummy_action result
pub const FALLBACK_RESULT: &str = "Fallback action executed. No operation performed.";

/// Tool that succeeds without doing anything
pub struct DummyActionTool {
    definition: ToolDefinition,
}

impl DummyActionTool {
    /// Create a new dummy action tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "dummy_action",
            "Default action used when no suitable tool is found.",
        )
        .with_category(ToolCategory::Utility);

        Self { definition }
    }
}

impl Default for DummyActionTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for DummyActionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
        Ok(ToolResult::success(
            serde_json::json!({ "result": FALLBACK_RESULT }),
            0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let result = DummyActionTool::new()
            .execute(serde_json::json!({"anything": 1}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.result_text().as_deref(), Some(FALLBACK_RESULT));
    }
}
