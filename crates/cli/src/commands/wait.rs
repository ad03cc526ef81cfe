// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stagehand wait`: block until jobs leave the queue

use anyhow::Result;
use clap::Args;
use stagehand_core::JobId;
use stagehand_engine::{Config, MonitorError, SystemEngine};

use crate::exit_error::ExitError;
use crate::output::{print_wait, OutputFormat};

#[derive(Args)]
pub struct WaitArgs {
    /// Scheduler job ids
    #[arg(required = true, value_name = "ID", value_parser = parse_id)]
    pub ids: Vec<JobId>,
    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    #[arg(long = "format", short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

fn parse_id(raw: &str) -> Result<JobId, String> {
    raw.parse::<JobId>().map_err(|e| e.to_string())
}

pub fn handle(args: WaitArgs, config: &Config) -> Result<()> {
    let engine = SystemEngine::from_config(config);
    let summary = engine
        .monitor()
        .wait_until(&args.ids, super::timeout(args.timeout))
        .map_err(|e| match e {
            MonitorError::DeadlineExceeded { .. } => ExitError::stage_failed(e.to_string()),
        })?;
    for id in summary.never_observed() {
        eprintln!("warning: job {id} was never observed in the queue");
    }
    print_wait(&summary, args.output)
}
