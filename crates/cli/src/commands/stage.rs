// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stagehand stage`: a batch as one stage, locally or on the cluster

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use stagehand_engine::{
    ArtifactProbe, Config, DispatchMode, LogMarkerProbe, SentinelProbe, SystemEngine,
};

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

/// How a finished cluster job's outcome is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum ProbeKind {
    /// Exit status recorded by the job wrapper
    #[default]
    Sentinel,
    /// Success/failure markers in the job's logs
    Markers,
    /// Declared outputs exist and are non-empty
    Artifacts,
}

#[derive(Args)]
pub struct StageArgs {
    /// Batch file (TOML) listing the stage's commands
    pub batch: PathBuf,
    /// Submit each command to the cluster instead of running it here
    #[arg(long, requires = "queue")]
    pub cluster: bool,
    /// Target queue (cluster only)
    #[arg(long, short = 'q')]
    pub queue: Option<String>,
    /// Slots per job, clamped to the queue's ceiling
    #[arg(long, default_value_t = 1)]
    pub slots: u32,
    /// Interpreter for the job script (default: cluster.interpreter)
    #[arg(long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,
    /// Stop waiting for jobs after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    #[arg(long, value_enum, default_value_t)]
    pub probe: ProbeKind,
    /// Concurrent commands when running locally
    #[arg(long, short = 'j', value_name = "N", conflicts_with = "cluster")]
    pub pool: Option<usize>,
    /// Report failures but exit zero
    #[arg(long)]
    pub advisory: bool,
    #[arg(long = "format", short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

impl StageArgs {
    fn mode(&self) -> Result<DispatchMode> {
        if !self.cluster {
            return Ok(DispatchMode::Local { pool_size: self.pool });
        }
        let Some(queue) = self.queue.clone() else {
            return Err(ExitError::usage("--cluster needs --queue").into());
        };
        Ok(DispatchMode::Cluster {
            queue,
            slots: self.slots,
            interpreter: self.interpreter.clone(),
            deadline: super::timeout(self.timeout),
        })
    }
}

pub fn handle(args: StageArgs, config: &Config) -> Result<()> {
    let stage = super::load_stage(&args.batch)?;
    let mode = args.mode()?;
    let engine = SystemEngine::from_config(config);
    let engine = match args.probe {
        ProbeKind::Sentinel => engine.with_probe(SentinelProbe::new()),
        ProbeKind::Markers => engine.with_probe(LogMarkerProbe),
        ProbeKind::Artifacts => engine.with_probe(ArtifactProbe),
    };
    super::conclude(engine.run_stage(&stage, &mode, super::policy(args.advisory)), args.output)
}
