//! Text tool - counting and simple transforms

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

/// Supported text operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOperation {
    /// Word and character counts
    Count,
    /// Upper-case the text
    Upper,
    /// Lower-case the text
    Lower,
    /// Reverse the characters
    Reverse,
}

impl TextOperation {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Reverse => "reverse",
        }
    }

    fn apply(self, text: &str) -> serde_json::Value {
        match self {
            Self::Count => {
                let words = text.split_whitespace().count();
                let characters = text.chars().count();
                serde_json::json!({
                    "words": words,
                    "characters": characters,
                    "result": format!("{} words, {} characters", words, characters),
                })
            }
            Self::Upper => serde_json::json!({ "result": text.to_uppercase() }),
            Self::Lower => serde_json::json!({ "result": text.to_lowercase() }),
            Self::Reverse => serde_json::json!({ "result": text.chars().rev().collect::<String>() }),
        }
    }
}

impl FromStr for TextOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "count" | "count_words" | "count_characters" => Ok(Self::Count),
            "upper" | "uppercase" => Ok(Self::Upper),
            "lower" | "lowercase" => Ok(Self::Lower),
            "reverse" => Ok(Self::Reverse),
            other => Err(Error::InvalidInput(format!(
                "Unknown text operation: {}",
                other
            ))),
        }
    }
}

/// Text processing tool
pub struct TextTool {
    definition: ToolDefinition,
}

impl TextTool {
    /// Create a new text tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "text",
            "Process text: count words and characters, change case, or reverse it.",
        )
        .with_category(ToolCategory::Text)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["count", "upper", "lower", "reverse"],
                    "description": "Operation to apply (default count)"
                },
                "text": {
                    "type": "string",
                    "description": "Input text"
                }
            },
            "required": ["text"]
        }));

        Self { definition }
    }
}

impl Default for TextTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for TextTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let text = input
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'text' parameter".to_string()))?;

        let operation = match input.get("operation").and_then(|v| v.as_str()) {
            Some(op) => op.parse()?,
            None => TextOperation::Count,
        };

        let mut output = operation.apply(text);
        output["operation"] = serde_json::json!(operation.as_str());

        Ok(ToolResult::success(
            output,
            start.elapsed().as_millis() as u64,
        ))
    }
}
