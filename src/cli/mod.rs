//! CLI module for Conductor
//!
//! - one-shot mode with `--task`
//! - interactive session otherwise

use anyhow::Context;
use clap::Parser;
use conductor_core::{build_orchestrator, format_error_for_cli, ConductorConfig, DispatchMode};
use conductor_llm::{LlmProvider, ModelRouter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub mod interactive;
pub mod render;

/// Conductor agent dispatcher
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(about = "Route tasks to a single agent or a multi-agent pipeline")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Requested mode recorded with each task
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<DispatchMode>,

    /// Run a single task and exit
    #[arg(short, long)]
    pub task: Option<String>,

    /// Debug logging and detailed result output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_mode(value: &str) -> Result<DispatchMode, String> {
    match value.parse::<DispatchMode>() {
        Ok(DispatchMode::Direct) | Err(_) => {
            Err(format!("invalid mode '{}', expected single or multi", value))
        }
        Ok(mode) => Ok(mode),
    }
}

fn load_model(config: &ConductorConfig) -> Option<Arc<dyn LlmProvider>> {
    let router = ModelRouter::default();
    match router.model_from_config(&config.model_config()) {
        Ok(model) => {
            info!(provider = %model.name(), "Model backend ready");
            Some(model)
        }
        Err(e) => {
            warn!(error = %e, "No model backend available, agents will use keyword rules");
            None
        }
    }
}

/// Run the CLI
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConductorConfig::load(cli.config.as_deref());
    interactive::print_banner(&config, cli.mode, cli.task.is_none());
    let model = load_model(&config);

    let orchestrator = build_orchestrator(&config, model)
        .map_err(|e| anyhow::anyhow!(format_error_for_cli(&e)))
        .context("failed to set up agents")?;

    match cli.task {
        Some(task) => {
            let result = orchestrator.execute_task(&task, cli.mode).await;
            render::print_result(&result, cli.verbose);
            Ok(())
        }
        None => interactive::run(&orchestrator, cli.mode, cli.verbose).await,
    }
}
