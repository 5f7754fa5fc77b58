//! Search tool - offline stub
//!
//! No network backend is wired in; the tool returns placeholder entries that
//! echo the query so downstream agents have something to reason over.

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use std::time::Instant;
use tracing::debug;

/// Maximum number of results to return
const MAX_RESULTS_CAP: usize = 10;

/// Default number of results
const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Debug, Clone, serde::Serialize)]
struct SearchResult {
    title: String,
    snippet: String,
}

/// Offline search tool
pub struct SearchTool {
    definition: ToolDefinition,
}

impl SearchTool {
    /// Create a new search tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "search",
            "Look up information for a query. Returns titles and snippets.",
        )
        .with_category(ToolCategory::Search)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (1-10, default 3)"
                }
            },
            "required": ["query"]
        }));

        Self { definition }
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'query' parameter".to_string()))?
            .trim();

        if query.is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let max_results = input
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| (n as usize).clamp(1, MAX_RESULTS_CAP))
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let results: Vec<SearchResult> = (1..=max_results)
            .map(|i| SearchResult {
                title: format!("Result {} for '{}'", i, query),
                snippet: format!("Placeholder information about {}.", query),
            })
            .collect();
        debug!(query = %query, count = results.len(), "Search stub answered");

        Ok(ToolResult::success(
            serde_json::json!({
                "query": query,
                "result": format!("Found {} results for '{}'", results.len(), query),
                "results": results,
                "total": results.len(),
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}
