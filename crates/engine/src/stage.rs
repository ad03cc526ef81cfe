// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One pipeline stage, end to end: dispatch, wait, judge.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stagehand_adapters::{HostResolver, ProcessRunner, Scheduler, SgeScheduler, ShellRunner, SystemHost};
use stagehand_core::{Clock, Command, SystemClock};

use crate::aggregate::{
    aggregate, aggregate_jobs, FailurePolicy, OutcomeProbe, SentinelProbe, StageReport,
};
use crate::config::Config;
use crate::dispatch::ClusterDispatcher;
use crate::env;
use crate::error::{ConfigError, EngineError};
use crate::local::{pool_size_for, LocalExecutor};
use crate::monitor::{JobMonitor, ProgressSink};

/// A named batch of commands, one per work item.
///
/// ```toml
/// name = "align"
///
/// [[command]]
/// item = "sample-01"
/// run = "bowtie2 -x ref -U s1.fq -S s1.sam"
/// success_marker = "overall alignment rate"
/// marker_stream = "stderr"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stage {
    pub name: String,
    #[serde(rename = "command", default)]
    pub commands: Vec<Command>,
}

impl Stage {
    pub fn new(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self { name: name.into(), commands }
    }

    /// Read a batch file. Relative working directories are resolved against
    /// the file's own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let mut stage = Self::from_toml(&text, path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for command in &mut stage.commands {
            if command.cwd.is_relative() {
                command.cwd = base.join(&command.cwd);
            }
        }
        stage.validate()?;
        Ok(stage)
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Every work item must appear once, with a non-empty invocation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for command in &self.commands {
            if command.invocation.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "item {:?} has an empty command",
                    command.item.as_str()
                )));
            }
            if !seen.insert(command.item.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "item {:?} appears more than once",
                    command.item.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Where a stage's commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    /// Local pool; `None` uses the configured ceiling.
    Local { pool_size: Option<usize> },
    Cluster {
        queue: String,
        slots: u32,
        interpreter: Option<PathBuf>,
        /// Give up waiting after this long; `None` waits forever.
        deadline: Option<Duration>,
    },
}

/// Local executor, dispatcher, monitor and probe wired from one [`Config`].
pub struct Engine<R, S, H, C> {
    executor: LocalExecutor<R>,
    dispatcher: ClusterDispatcher<S, H, C>,
    monitor: JobMonitor<S, C>,
    probe: Box<dyn OutcomeProbe>,
    max_workers: usize,
}

/// Engine backed by the real shell, scheduler binaries, host and clock.
pub type SystemEngine = Engine<ShellRunner, SgeScheduler, SystemHost, SystemClock>;

impl SystemEngine {
    pub fn from_config(config: &Config) -> Self {
        let scheduler = SgeScheduler::new(config.cluster.qsub.clone(), config.cluster.qstat.clone())
            .with_qstat_args(config.cluster.qstat_args.clone());
        Engine::new(
            config,
            ShellRunner::new(config.local.shell.clone()),
            scheduler,
            SystemHost::with_override(env::hostname()),
            SystemClock,
        )
    }
}

impl<R, S, H, C> Engine<R, S, H, C>
where
    R: ProcessRunner,
    S: Scheduler + Clone,
    H: HostResolver,
    C: Clock,
{
    pub fn new(config: &Config, runner: R, scheduler: S, host: H, clock: C) -> Self {
        Self {
            executor: LocalExecutor::new(runner),
            dispatcher: ClusterDispatcher::new(
                scheduler.clone(),
                host,
                clock.clone(),
                config.cluster.clone(),
            ),
            monitor: JobMonitor::new(scheduler, clock, config.monitor.poll_interval()),
            probe: Box::new(SentinelProbe::new()),
            max_workers: config.local.max_workers,
        }
    }

    pub fn with_probe(mut self, probe: impl OutcomeProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.monitor = self.monitor.with_progress(sink);
        self
    }

    pub fn executor(&self) -> &LocalExecutor<R> {
        &self.executor
    }

    pub fn dispatcher(&self) -> &ClusterDispatcher<S, H, C> {
        &self.dispatcher
    }

    pub fn monitor(&self) -> &JobMonitor<S, C> {
        &self.monitor
    }

    /// Local pool size for a request, capped by the configured ceiling.
    pub fn pool_size(&self, requested: Option<usize>, batch: usize) -> usize {
        let requested = requested.unwrap_or(self.max_workers).min(self.max_workers);
        pool_size_for(requested, batch)
    }

    /// Run a whole stage and judge it.
    ///
    /// A failed item is not an error here: it shows up in the report, and
    /// the caller decides with [`StageReport::should_proceed`]. Errors are
    /// reserved for submission failures and an exceeded wait deadline.
    pub fn run_stage(
        &self,
        stage: &Stage,
        mode: &DispatchMode,
        policy: FailurePolicy,
    ) -> Result<StageReport, EngineError> {
        tracing::info!(stage = %stage.name, items = stage.commands.len(), ?mode, "running stage");
        let report = match mode {
            DispatchMode::Local { pool_size } => {
                let pool = self.pool_size(*pool_size, stage.commands.len());
                let results = self.executor.run_local(&stage.commands, pool);
                aggregate(&results, policy)
            }
            DispatchMode::Cluster { queue, slots, interpreter, deadline } => {
                let jobs = self.dispatcher.submit_all(
                    &stage.commands,
                    queue,
                    *slots,
                    interpreter.as_deref(),
                )?;
                let ids: Vec<_> = jobs.iter().map(|job| job.id).collect();
                let summary = self.monitor.wait_until(&ids, *deadline)?;
                aggregate_jobs(&jobs, &summary, self.probe.as_ref(), policy)
            }
        };
        Ok(report.with_stage(stage.name.clone()))
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
