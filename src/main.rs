// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! sitepilot - conversational editor for website content
//!
//! Entry point for the sitepilot CLI application.

use clap::Parser;

use sitepilot::cli::{Cli, Commands};
use sitepilot::config::Settings;
use sitepilot::error::Result;

#[path = "main/commands.rs"]
mod commands;
#[path = "main/runtime.rs"]
mod runtime;

use commands::{run_chat, run_doc, run_history};
use runtime::Runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on engine diagnostics; `RUST_LOG` still takes precedence.
    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { "trace" } else { "debug" };
        for target in [
            "sitepilot.agent.engine",
            "sitepilot.tools.executor",
            "sitepilot.llm",
            "sitepilot.cli",
        ] {
            if let Ok(parsed) = format!("{}={}", target, level).parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    let runtime = Runtime::open(settings)?;

    match cli.command {
        Commands::Chat(args) => run_chat(args, runtime, cli.format).await,
        Commands::History(args) => run_history(args, runtime, cli.format).await,
        Commands::Doc(args) => run_doc(args, runtime, cli.format).await,
    }
}
