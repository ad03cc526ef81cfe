// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stagehand submit`: one job, printed as its scheduler id

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args};
use stagehand_core::Command;
use stagehand_engine::{Config, Submission, SystemEngine};

use crate::exit_error::ExitError;
use crate::output::{print_submission, OutputFormat};

#[derive(Args)]
#[command(group(ArgGroup::new("work").required(true).args(["command", "file"])))]
pub struct SubmitArgs {
    /// Target queue
    #[arg(long, short = 'q')]
    pub queue: String,
    /// Slots to request, clamped to the queue's ceiling
    #[arg(long, default_value_t = 1)]
    pub slots: u32,
    /// Interpreter for the job (default: cluster.interpreter)
    #[arg(long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,
    /// Job name (default: derived from --item)
    #[arg(long)]
    pub name: Option<String>,
    /// Shell command to run
    #[arg(long, short = 'c')]
    pub command: Option<String>,
    /// Prepared script to submit as-is
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Working directory of the job
    #[arg(long, default_value = ".")]
    pub cwd: PathBuf,
    /// Work item the job belongs to
    #[arg(long, default_value = "job")]
    pub item: String,
    #[arg(long = "format", short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

impl SubmitArgs {
    fn submission(&self) -> Result<Submission> {
        match (&self.command, &self.file) {
            (Some(invocation), None) => Ok(Submission::Inline(
                Command::new(self.item.as_str(), invocation.as_str()).cwd(&self.cwd),
            )),
            (None, Some(path)) => {
                let command =
                    Command::new(self.item.as_str(), path.display().to_string()).cwd(&self.cwd);
                Ok(Submission::File { command, path: path.clone() })
            }
            _ => Err(ExitError::usage("exactly one of --command or --file is required").into()),
        }
    }
}

pub fn handle(args: SubmitArgs, config: &Config) -> Result<()> {
    let submission = args.submission()?;
    let engine = SystemEngine::from_config(config);
    let handle = engine
        .dispatcher()
        .submit_named(
            submission,
            args.name.as_deref(),
            &args.queue,
            args.slots,
            args.interpreter.as_deref(),
        )
        .map_err(|e| ExitError::usage(e.to_string()))?;
    print_submission(&handle, args.output)
}
