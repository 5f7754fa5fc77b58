//! Terminal rendering of results and history

use conductor_core::complexity::{self, ComplexityReport};
use conductor_core::{AggregatedResult, DispatchMode, HistoryEntry, HistoryStatus};

fn mode_label(mode: DispatchMode) -> &'static str {
    match mode {
        DispatchMode::Direct => "⚡ direct",
        DispatchMode::Single => "🤖 single-agent",
        DispatchMode::Multi => "👥 multi-agent",
    }
}

/// Render a result as display text
pub fn format_result(result: &AggregatedResult, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Mode: {} (complexity {:.1})\n",
        mode_label(result.mode),
        result.complexity
    ));

    if verbose {
        out.push_str(&format_report(&complexity::report(&result.task)));
        for (role, stage) in &result.stages {
            let status = if stage.is_success() { "✅" } else { "❌" };
            out.push_str(&format!("  {} {}\n", status, role));
            out.push_str(&format!(
                "     {}\n",
                stage.rendered().unwrap_or_else(|| "None".to_string())
            ));
        }
        if let Some(outcome) = &result.outcome {
            out.push_str(&format!("  outcome: {}\n", outcome));
        }
    }

    out.push_str(&format!("\n{}\n", result.answer));
    out
}

/// Render a complexity breakdown
pub fn format_report(report: &ComplexityReport) -> String {
    let mut out = String::from("Complexity breakdown:\n");
    for hit in &report.operations {
        out.push_str(&format!(
            "  pattern {:<40} x{} = {:.1}\n",
            hit.pattern,
            hit.matches,
            hit.weight * hit.matches as f64
        ));
    }
    out.push_str(&format!(
        "  words {} = {:.1}\n",
        report.words,
        report.length_score()
    ));
    out.push_str(&format!(
        "  punctuation {} = {:.1}\n",
        report.punctuation,
        report.punctuation_score()
    ));
    if !report.categories.is_empty() {
        out.push_str(&format!(
            "  categories [{}] = {:.1}\n",
            report.categories.join(", "),
            report.category_score()
        ));
    }
    out.push_str(&format!(
        "  total {:.1} (raw {:.1})\n",
        report.total, report.raw
    ));
    out
}

/// Render the history list
pub fn format_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No tasks yet.\n".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let status = match entry.status {
                HistoryStatus::Completed => "✅",
                HistoryStatus::Failed => "❌",
            };
            format!(
                "{:>3}. {} [{}] {} ({:.3}s)\n",
                i + 1,
                status,
                entry.mode,
                entry.task,
                entry.execution_time
            )
        })
        .collect()
}

/// Print a result to stdout
pub fn print_result(result: &AggregatedResult, verbose: bool) {
    println!("{}", format_result(result, verbose));
}
