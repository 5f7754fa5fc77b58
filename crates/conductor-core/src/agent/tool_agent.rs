//! Tool agent - model-guided tool loop
//!
//! With a model, each iteration asks for the next step as JSON, either
//! `{"action": "<tool>", "input": {...}}` or `{"answer": "..."}`, runs the
//! tool and feeds the observation back. Without a model, or when a reply
//! cannot be used, the keyword resolver picks one action and its result is
//! the outcome.

use super::resolver::{Action, ActionResolver};
use super::{AgentConfig, AgentOutcome, CapabilityAgent, DispatchOptions};
use crate::error::Result;
use conductor_llm::{LlmProvider, Message};
use conductor_tools::{ExecutionOptions, ToolRunner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const FALLBACK_TOOL: &str = "dummy_action";

/// One executed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The call
    #[serde(flatten)]
    pub action: Action,
    /// Whether the tool succeeded
    pub success: bool,
    /// Tool output
    pub output: serde_json::Value,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    fn answer(&self) -> Option<String> {
        if !self.success {
            return None;
        }
        match self.output.get("result") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    fn observation(&self) -> String {
        match &self.error {
            Some(error) => serde_json::json!({ "success": false, "error": error }).to_string(),
            None => serde_json::json!({ "success": true, "output": self.output }).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelReply {
    Answer { answer: serde_json::Value },
    Act(Action),
}

fn parse_reply(reply: &str) -> Option<ModelReply> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

/// Capability-backed agent that reaches tools through a [`ToolRunner`]
pub struct ToolAgent {
    config: AgentConfig,
    runner: ToolRunner,
    resolver: Arc<dyn ActionResolver>,
    model: Option<Arc<dyn LlmProvider>>,
}

impl ToolAgent {
    /// Create a rule-based agent
    #[must_use]
    pub fn new(config: AgentConfig, runner: ToolRunner, resolver: Arc<dyn ActionResolver>) -> Self {
        Self {
            config,
            runner,
            resolver,
            model: None,
        }
    }

    /// Attach a model for the guided loop
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn LlmProvider>) -> Self {
        self.model = Some(model);
        self
    }

    /// Get the agent name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn execution_options(&self) -> ExecutionOptions {
        if self.config.tools.is_empty() {
            return ExecutionOptions::default();
        }
        let mut allowed = self.config.tools.clone();
        if !allowed.iter().any(|t| t == FALLBACK_TOOL) {
            allowed.push(FALLBACK_TOOL.to_string());
        }
        ExecutionOptions::default().with_allowed_tools(allowed)
    }

    async fn run_action(&self, action: Action) -> Step {
        debug!(agent = %self.config.name, tool = %action.name, "Running action");
        match self
            .runner
            .execute_with_options(&action.name, action.input.clone(), self.execution_options())
            .await
        {
            Ok(executed) => Step {
                action,
                success: executed.result.success,
                output: executed.result.output,
                error: executed.result.error,
            },
            Err(e) => {
                warn!(agent = %self.config.name, tool = %action.name, error = %e, "Action rejected");
                Step {
                    action,
                    success: false,
                    output: serde_json::Value::Null,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}, an agent that completes tasks with tools.\n",
            self.config.name
        );
        if let Some(extra) = &self.config.system_prompt {
            prompt.push_str(extra);
            prompt.push('\n');
        }
        prompt.push_str("Available tools:\n");
        prompt.push_str(&self.runner.registry().describe(&self.config.tools));
        prompt.push_str(
            "\n\nReply with JSON only. To use a tool: {\"action\": \"<tool>\", \"input\": {...}}. \
             When finished: {\"answer\": \"<final answer>\"}.",
        );
        prompt
    }

    fn outcome(&self, steps: Vec<Step>, answer: Option<String>) -> AgentOutcome {
        let last_ok = steps.last().is_none_or(|s| s.success);
        let answer = answer.or_else(|| steps.last().and_then(Step::answer));
        let result = serde_json::json!({ "agent": self.config.name, "steps": steps });

        if answer.is_some() || last_ok {
            AgentOutcome::success(result, answer)
        } else {
            let error = steps
                .last()
                .and_then(|s| s.error.clone())
                .unwrap_or_else(|| "action failed".to_string());
            let mut outcome = AgentOutcome::error(error);
            outcome.result = result;
            outcome
        }
    }

    async fn resolve_once(&self, task: &str, mut steps: Vec<Step>) -> AgentOutcome {
        let action = self.resolver.resolve(task);
        steps.push(self.run_action(action).await);
        self.outcome(steps, None)
    }

    async fn guided(&self, model: &dyn LlmProvider, task: &str) -> AgentOutcome {
        let system = self.system_prompt();
        let mut messages = vec![Message::user(format!("Task: {}", task))];
        let mut steps: Vec<Step> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let reply = match model.ask(messages.clone(), Some(system.as_str())).await {
                Ok(response) => response.content,
                Err(e) => {
                    warn!(agent = %self.config.name, error = %e, "Model call failed, using keyword resolver");
                    return self.resolve_once(task, steps).await;
                }
            };

            match parse_reply(&reply) {
                Some(ModelReply::Answer { answer }) => {
                    let answer = match answer {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    debug!(agent = %self.config.name, iteration, "Model answered");
                    return self.outcome(steps, Some(answer));
                }
                Some(ModelReply::Act(action)) => {
                    let step = self.run_action(action).await;
                    messages.push(Message::assistant(reply));
                    messages.push(Message::user(format!("Observation: {}", step.observation())));
                    steps.push(step);
                }
                None => {
                    debug!(agent = %self.config.name, "Unparseable model reply, using keyword resolver");
                    return self.resolve_once(task, steps).await;
                }
            }
        }

        warn!(
            agent = %self.config.name,
            max_iterations = self.config.max_iterations,
            "Iteration limit reached"
        );
        if steps.is_empty() {
            return AgentOutcome::error("iteration limit reached without any step");
        }
        self.outcome(steps, None)
    }
}

#[async_trait::async_trait]
impl CapabilityAgent for ToolAgent {
    #[instrument(skip(self, options), fields(agent = %self.config.name))]
    async fn execute(&self, task: &str, options: &DispatchOptions) -> Result<AgentOutcome> {
        info!(requested_mode = ?options.requested_mode, "Agent executing task");
        let outcome = match &self.model {
            Some(model) => self.guided(model.as_ref(), task).await,
            None => self.resolve_once(task, Vec::new()).await,
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::KeywordActionResolver;
    use crate::agent::OutcomeStatus;
    use conductor_llm::MockProvider;
    use conductor_tools::{register_builtins, ToolRegistry};

    fn runner() -> ToolRunner {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        ToolRunner::with_defaults(Arc::new(registry))
    }

    fn agent(config: AgentConfig) -> ToolAgent {
        ToolAgent::new(config, runner(), Arc::new(KeywordActionResolver::new()))
    }

    #[tokio::test]
    async fn test_rule_based_calculation() {
        let outcome = agent(AgentConfig::new("solo"))
            .execute("calculate 6 * 7", &DispatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.answer.as_deref(), Some("42"));
        assert_eq!(outcome.result["steps"][0]["action"], "calculator");
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_outcome() {
        let outcome = agent(AgentConfig::new("solo"))
            .execute("calculate 1 / 0", &DispatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.unwrap().contains("Division by zero"));
    }

    #[tokio::test]
    async fn test_allow_list_rejects_other_tools() {
        let config = AgentConfig::new("searcher").with_tools(vec!["search".to_string()]);
        let outcome = agent(config)
            .execute("calculate 2 + 2", &DispatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn test_dummy_action_always_allowed() {
        let config = AgentConfig::new("searcher").with_tools(vec!["search".to_string()]);
        let outcome = agent(config)
            .execute("tell me a joke", &DispatchOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_guided_loop_uses_tool_then_answers() {
        let model = Arc::new(MockProvider::with_responses([
            r#"{"action": "calculator", "input": {"expression": "3 + 4"}}"#,
            r#"Sure: {"answer": "The sum is 7"}"#,
        ]));
        let outcome = agent(AgentConfig::new("guided"))
            .with_model(model.clone())
            .execute("add three and four", &DispatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.answer.as_deref(), Some("The sum is 7"));
        assert_eq!(outcome.result["steps"].as_array().unwrap().len(), 1);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert!(last.content.starts_with("Observation: "));
        assert!(last.content.contains("\"7\""));
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back_to_resolver() {
        let model = Arc::new(MockProvider::new());
        let outcome = agent(AgentConfig::new("guided"))
            .with_model(model)
            .execute("search for rust", &DispatchOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.result["steps"][0]["action"], "search");
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let model = Arc::new(MockProvider::with_responses([
            r#"{"action": "dummy_action", "input": {}}"#,
            r#"{"action": "dummy_action", "input": {}}"#,
            r#"{"action": "dummy_action", "input": {}}"#,
        ]));
        let outcome = agent(AgentConfig::new("looper").with_max_iterations(2))
            .with_model(model.clone())
            .execute("loop", &DispatchOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.result["steps"].as_array().unwrap().len(), 2);
        assert_eq!(model.requests().len(), 2);
    }

    #[test]
    fn test_parse_reply() {
        assert!(matches!(
            parse_reply(r#"{"answer": 4}"#),
            Some(ModelReply::Answer { .. })
        ));
        assert!(matches!(
            parse_reply(r#"```json {"action": "search", "input": {"query": "q"}} ```"#),
            Some(ModelReply::Act(_))
        ));
        assert!(parse_reply("no json here").is_none());
        assert!(parse_reply("} {").is_none());
    }
}
