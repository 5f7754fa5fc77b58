//! Keyword action resolution
//!
//! Rules are tried in order: arithmetic, search, text. A task matching none
//! of them resolves to `dummy_action`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ARITHMETIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:calculate|compute|evaluate)\b:?\s*(.*)").ok());

static SEARCH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:search(?:\s+for)?|find|look\s+up)\b:?\s*(.*)").ok()
});

static TEXT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(count|uppercase|lowercase|reverse)\b:?\s*(.*)").ok()
});

static QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).ok());

/// One tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name
    #[serde(rename = "action")]
    pub name: String,
    /// Tool input
    #[serde(default)]
    pub input: serde_json::Value,
}

impl Action {
    /// Create an action
    #[must_use]
    pub fn new(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    /// The fallback action
    #[must_use]
    pub fn dummy(task: &str) -> Self {
        Self::new("dummy_action", serde_json::json!({ "task": task }))
    }
}

/// Maps a task to a single tool call
pub trait ActionResolver: Send + Sync {
    /// Pick the action for a task
    fn resolve(&self, task: &str) -> Action;
}

/// Rule-based resolver keyed on verbs in the task
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordActionResolver;

impl KeywordActionResolver {
    /// Create a resolver
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn trim_terminal(s: &str) -> &str {
    s.trim().trim_end_matches(['?', '.', '!']).trim_end()
}

fn tail<'t>(re: &LazyLock<Option<Regex>>, task: &'t str, group: usize) -> Option<&'t str> {
    let re = re.as_ref()?;
    re.captures(task)
        .and_then(|caps| caps.get(group))
        .map(|m| trim_terminal(m.as_str()))
}

fn arithmetic(task: &str) -> Option<Action> {
    let expression = tail(&ARITHMETIC, task, 1)?;
    if !expression.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(Action::new(
        "calculator",
        serde_json::json!({ "expression": expression }),
    ))
}

fn search(task: &str) -> Option<Action> {
    let query = tail(&SEARCH, task, 1)?;
    let query = if query.is_empty() {
        trim_terminal(task)
    } else {
        query
    };
    Some(Action::new("search", serde_json::json!({ "query": query })))
}

fn text(task: &str) -> Option<Action> {
    let caps = TEXT.as_ref()?.captures(task)?;
    let operation = match caps.get(1)?.as_str().to_lowercase().as_str() {
        "uppercase" => "upper",
        "lowercase" => "lower",
        "reverse" => "reverse",
        _ => "count",
    };
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let quoted = QUOTED
        .as_ref()
        .and_then(|re| re.captures(rest))
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str());
    let text = match quoted {
        Some(q) => q,
        None => match rest.split_once(':') {
            Some((_, after)) => after.trim(),
            None => trim_terminal(rest),
        },
    };
    Some(Action::new(
        "text",
        serde_json::json!({ "operation": operation, "text": text }),
    ))
}

impl ActionResolver for KeywordActionResolver {
    fn resolve(&self, task: &str) -> Action {
        arithmetic(task)
            .or_else(|| search(task))
            .or_else(|| text(task))
            .unwrap_or_else(|| Action::dummy(task))
    }
}
