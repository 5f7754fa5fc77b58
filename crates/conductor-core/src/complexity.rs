//! Complexity scoring
//!
//! A task's score is the sum of four signals, clamped to [`MAX_SCORE`]:
//! weighted operation-pattern matches, word count, punctuation density and
//! the number of tool categories the task mentions. Patterns match as plain
//! substrings of the lower-cased task, so "understand" counts one `and`.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Scores below this run on the single agent
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Upper bound of every score
pub const MAX_SCORE: f64 = 10.0;

/// Weight per whitespace-delimited word
pub const WORD_WEIGHT: f64 = 0.1;

/// Weight per character that is neither alphanumeric nor whitespace
pub const PUNCTUATION_WEIGHT: f64 = 0.2;

/// Weight per tool category the task mentions
pub const CATEGORY_WEIGHT: f64 = 1.5;

/// Operation patterns and their weight per match
pub const OPERATION_PATTERNS: &[(&str, f64)] = &[
    ("calculate|compute|evaluate", 1.0),
    ("search|find|look up", 1.0),
    (r"(count|process|analyze|transform)\s+text", 1.0),
    (r"run\s+code|execute", 1.5),
    ("compare|contrast|evaluate", 2.0),
    ("optimize|improve|enhance", 2.5),
    ("and|then|after|before", 1.0),
    ("if|when|unless|otherwise", 1.5),
    ("all|every|each", 1.0),
    ("most|best|optimal", 1.5),
];

/// Keyword sets per tool category
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("arithmetic", &["calculate", "compute", "evaluate", "math"]),
    ("search", &["search", "find", "look up", "query"]),
    ("text", &["text", "string", "characters", "words"]),
    ("code", &["code", "execute", "run", "python"]),
];

static COMPILED_PATTERNS: LazyLock<Vec<(Regex, &'static str, f64)>> = LazyLock::new(|| {
    OPERATION_PATTERNS
        .iter()
        .filter_map(|&(pattern, weight)| {
            Regex::new(pattern).ok().map(|re| (re, pattern, weight))
        })
        .collect()
});

/// Matches of one operation pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternHit {
    /// Pattern source
    pub pattern: &'static str,
    /// Weight per match
    pub weight: f64,
    /// Number of non-overlapping matches
    pub matches: usize,
}

/// Per-signal breakdown of a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityReport {
    /// Operation patterns with at least one match
    pub operations: Vec<PatternHit>,
    /// Whitespace-delimited word count
    pub words: usize,
    /// Characters that are neither alphanumeric nor whitespace
    pub punctuation: usize,
    /// Tool categories mentioned by the task
    pub categories: Vec<&'static str>,
    /// Sum of all contributions before clamping
    pub raw: f64,
    /// Clamped score
    pub total: f64,
}

impl ComplexityReport {
    /// Contribution of the operation patterns
    #[must_use]
    pub fn operation_score(&self) -> f64 {
        self.operations
            .iter()
            .map(|hit| hit.weight * hit.matches as f64)
            .sum()
    }

    /// Contribution of the word count
    #[must_use]
    pub fn length_score(&self) -> f64 {
        self.words as f64 * WORD_WEIGHT
    }

    /// Contribution of punctuation
    #[must_use]
    pub fn punctuation_score(&self) -> f64 {
        self.punctuation as f64 * PUNCTUATION_WEIGHT
    }

    /// Contribution of tool categories
    #[must_use]
    pub fn category_score(&self) -> f64 {
        self.categories.len() as f64 * CATEGORY_WEIGHT
    }
}

/// Score a task with its breakdown
#[must_use]
pub fn report(task: &str) -> ComplexityReport {
    let lower = task.to_lowercase();

    let operations: Vec<PatternHit> = COMPILED_PATTERNS
        .iter()
        .map(|(re, pattern, weight)| PatternHit {
            pattern,
            weight: *weight,
            matches: re.find_iter(&lower).count(),
        })
        .filter(|hit| hit.matches > 0)
        .collect();

    let words = task.split_whitespace().count();
    let punctuation = task
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();

    let categories: Vec<&'static str> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .collect();

    let mut report = ComplexityReport {
        operations,
        words,
        punctuation,
        categories,
        raw: 0.0,
        total: 0.0,
    };
    report.raw = report.operation_score()
        + report.length_score()
        + report.punctuation_score()
        + report.category_score();
    report.total = report.raw.min(MAX_SCORE);
    report
}

/// Score a task in `[0.0, MAX_SCORE]`
#[must_use]
pub fn score(task: &str) -> f64 {
    report(task).total
}
