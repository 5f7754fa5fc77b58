//! Interactive session

use super::render;
use conductor_core::{ConductorConfig, DispatchMode, TaskOrchestrator};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Commands understood by the prompt besides plain tasks
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    History,
    Last,
    Empty,
    Task(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => Command::Empty,
        "exit" | "quit" => Command::Exit,
        "history" => Command::History,
        "last" => Command::Last,
        _ => Command::Task(line),
    }
}

fn banner(config: &ConductorConfig, mode: Option<DispatchMode>, interactive: bool) -> String {
    let mut out = format!("🎼 Conductor v{}\n", env!("CARGO_PKG_VERSION"));
    out.push_str(&format!(
        "   agent: {}  provider: {}  threshold: {:.1}\n",
        config.agent.name, config.llm.provider, config.complexity.threshold
    ));
    if let Some(mode) = mode.or_else(|| config.requested_mode()) {
        out.push_str(&format!("   requested mode: {}\n", mode));
    }
    if interactive {
        out.push_str("   Type a task, 'history', 'last', or 'exit'.\n");
    }
    out
}

/// Print the welcome banner
pub(crate) fn print_banner(config: &ConductorConfig, mode: Option<DispatchMode>, interactive: bool) {
    println!("{}", banner(config, mode, interactive));
}

/// Read tasks from stdin until `exit`, `quit` or end of input
pub async fn run(
    orchestrator: &TaskOrchestrator,
    mode: Option<DispatchMode>,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_command(&line) {
            Command::Exit => break,
            Command::Empty => {}
            Command::History => print!("{}", render::format_history(&orchestrator.history())),
            Command::Last => match orchestrator.last_result() {
                Some(result) => render::print_result(&result, verbose),
                None => println!("No tasks yet."),
            },
            Command::Task(task) => {
                let result = orchestrator.execute_task(task, mode).await;
                render::print_result(&result, verbose);
            }
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
