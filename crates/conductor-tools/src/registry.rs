//! Registry - Tool registration and discovery
//!
//! Tools are registered with a definition (name, description, parameter
//! schema, category) and looked up by name when an agent picks an action.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Tool category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Arithmetic evaluation
    Arithmetic,
    /// Information lookup
    Search,
    /// Text processing
    Text,
    /// Code execution
    Code,
    /// Utility operations
    Utility,
}

impl ToolCategory {
    /// Every category, in listing order
    pub const ALL: [Self; 5] = [
        Self::Arithmetic,
        Self::Search,
        Self::Text,
        Self::Code,
        Self::Utility,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Search => "search",
            Self::Text => "text",
            Self::Code => "code",
            Self::Utility => "utility",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool metadata and schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
    /// Tool category
    pub category: ToolCategory,
    /// Whether the tool is enabled
    pub enabled: bool,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            category: ToolCategory::Utility,
            enabled: true,
        }
    }

    /// Set the parameters schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Names listed under `required` in the parameter schema
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|v| v.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output data
    pub output: serde_json::Value,
    /// Error message if failed
    pub error: Option<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(output: serde_json::Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// The `result` field of the output, rendered as text
    #[must_use]
    pub fn result_text(&self) -> Option<String> {
        match self.output.get("result")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with given input
    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult>;

    /// Validate input before execution
    ///
    /// The default checks that input is an object carrying every required
    /// parameter.
    fn validate_input(&self, input: &serde_json::Value) -> Result<()> {
        let Some(object) = input.as_object() else {
            return Err(Error::InvalidInput("Input must be an object".to_string()));
        };
        for name in self.definition().required_parameters() {
            if !object.contains_key(name) {
                return Err(Error::InvalidInput(format!(
                    "Missing '{}' parameter",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Registry for managing tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    definitions: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let def = tool.definition();
        let name = def.name.clone();
        debug!(tool = %name, "Registering tool");
        self.definitions.insert(name.clone(), def.clone());
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// List enabled tool definitions, sorted by name
    #[must_use]
    pub fn list_enabled(&self) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> =
            self.definitions.values().filter(|d| d.enabled).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List tools of one category, sorted by name
    #[must_use]
    pub fn list_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> = self
            .definitions
            .values()
            .filter(|d| d.category == category)
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Disable a tool
    pub fn disable(&mut self, name: &str) -> bool {
        if let Some(def) = self.definitions.get_mut(name) {
            def.enabled = false;
            true
        } else {
            false
        }
    }

    /// Check whether a tool is registered and enabled
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.definitions.get(name).is_some_and(|d| d.enabled)
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Enabled tools grouped by category, for model prompts
    ///
    /// When `only` is non-empty the listing is restricted to those names.
    /// Categories without a listed tool are left out.
    #[must_use]
    pub fn describe(&self, only: &[String]) -> String {
        ToolCategory::ALL
            .iter()
            .filter_map(|&category| {
                let lines: Vec<String> = self
                    .list_by_category(category)
                    .into_iter()
                    .filter(|d| d.enabled)
                    .filter(|d| only.is_empty() || only.iter().any(|n| n == &d.name))
                    .map(|d| {
                        format!("- {}: {} (parameters: {})", d.name, d.description, d.parameters)
                    })
                    .collect();
                (!lines.is_empty()).then(|| format!("{}:\n{}", category, lines.join("\n")))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool {
        definition: ToolDefinition,
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
            Ok(ToolResult::success(input, 0))
        }
    }

    fn echo() -> Arc<dyn Tool> {
        Arc::new(EchoTool {
            definition: ToolDefinition::new("echo", "Echo the input")
                .with_category(ToolCategory::Text)
                .with_parameters(serde_json::json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                })),
        })
    }

    #[test]
    fn test_tool_definition_builder() {
        let def = ToolDefinition::new("test_tool", "A test tool").with_category(ToolCategory::Search);

        assert_eq!(def.name, "test_tool");
        assert_eq!(def.category, ToolCategory::Search);
        assert!(def.enabled);
        assert!(def.required_parameters().is_empty());
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success(serde_json::json!({"result": "4"}), 100);
        assert!(success.success);
        assert_eq!(success.result_text(), Some("4".to_string()));

        let failure = ToolResult::failure("test error", 50);
        assert!(!failure.success);
        assert_eq!(failure.error, Some("test error".to_string()));
        assert_eq!(failure.result_text(), None);
    }

    #[test]
    fn test_validate_input_checks_required() {
        let tool = echo();
        assert!(tool.validate_input(&serde_json::json!({"text": "hi"})).is_ok());
        assert!(matches!(
            tool.validate_input(&serde_json::json!({})),
            Err(Error::InvalidInput(_))
        ));
        assert!(tool.validate_input(&serde_json::json!("hi")).is_err());
    }

    #[test]
    fn test_registry_enable_disable() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(echo());
        assert_eq!(registry.len(), 1);
        assert!(registry.is_enabled("echo"));
        assert_eq!(registry.list_by_category(ToolCategory::Text).len(), 1);

        assert!(registry.disable("echo"));
        assert!(!registry.is_enabled("echo"));
        assert!(registry.list_enabled().is_empty());
        assert!(!registry.disable("missing"));
    }

    #[test]
    fn test_describe_filters_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());

        assert!(registry.describe(&[]).starts_with("text:\n- echo: Echo the input"));
        assert!(registry.describe(&["other".to_string()]).is_empty());
    }

    #[test]
    fn test_describe_groups_by_category() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());
        registry.register(Arc::new(EchoTool {
            definition: ToolDefinition::new("adder", "Adds").with_category(ToolCategory::Arithmetic),
        }));
        registry.register(Arc::new(EchoTool {
            definition: ToolDefinition::new("shout", "Shouts").with_category(ToolCategory::Text),
        }));
        registry.disable("shout");

        let described = registry.describe(&[]);
        let headers: Vec<&str> = described.lines().filter(|l| !l.starts_with('-')).collect();
        assert_eq!(headers, vec!["arithmetic:", "text:"]);
        assert!(described.contains("- adder: Adds"));
        assert!(!described.contains("shout"));
    }
}
