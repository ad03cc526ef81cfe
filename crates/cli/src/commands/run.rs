// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stagehand run`: a batch on the local pool

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use stagehand_engine::{Config, DispatchMode, SystemEngine};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct RunArgs {
    /// Batch file (TOML) listing the stage's commands
    pub batch: PathBuf,
    /// Concurrent commands (default and ceiling: local.max_workers)
    #[arg(long, short = 'j', value_name = "N")]
    pub pool: Option<usize>,
    /// Report failures but exit zero
    #[arg(long)]
    pub advisory: bool,
    #[arg(long = "format", short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub fn handle(args: RunArgs, config: &Config) -> Result<()> {
    let stage = super::load_stage(&args.batch)?;
    let engine = SystemEngine::from_config(config);
    let mode = DispatchMode::Local { pool_size: args.pool };
    super::conclude(engine.run_stage(&stage, &mode, super::policy(args.advisory)), args.output)
}
