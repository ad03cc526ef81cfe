// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stagehand: run a pipeline stage locally or on a grid scheduler

mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stagehand_engine::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::exit_error::{ExitError, EXIT_USAGE};

/// Environment variable holding the log filter (`RUST_LOG` syntax).
const LOG_ENV: &str = "STAGEHAND_LOG";

#[derive(Parser)]
#[command(name = "stagehand", version, about = "Dispatch pipeline-stage commands and judge the outcome")]
#[command(styles = color::styles())]
struct Cli {
    /// Config file (default: $STAGEHAND_CONFIG, then ~/.config/stagehand/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch of commands on the local worker pool
    Run(commands::run::RunArgs),
    /// Run a batch as one stage, locally or on the cluster
    Stage(commands::stage::StageArgs),
    /// Submit a single job to the scheduler
    Submit(commands::submit::SubmitArgs),
    /// Wait until the given jobs leave the queue
    Wait(commands::wait::WaitArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        let code = match err.downcast_ref::<ExitError>() {
            Some(exit) => exit.code,
            None => EXIT_USAGE,
        };
        let message = format!("{err:#}");
        if !message.is_empty() {
            eprintln!("error: {message}");
        }
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load(cli.config.as_deref()).map_err(|e| ExitError::usage(e.to_string()))?;
    tracing::debug!(?config, "configuration resolved");
    match command {
        Command::Run(args) => commands::run::handle(args, &config),
        Command::Stage(args) => commands::stage::handle(args, &config),
        Command::Submit(args) => commands::submit::handle(args, &config),
        Command::Wait(args) => commands::wait::handle(args, &config),
    }
}
