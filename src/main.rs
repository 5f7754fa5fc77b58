//! Conductor - complexity-routed agent dispatch
//!
//! CLI entry point: runs one task or an interactive session.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "conductor=debug,conductor_core=debug,conductor_tools=debug,conductor_llm=debug"
    } else {
        "conductor=info,conductor_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run(cli).await
}
