// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster batch scheduler adapter (Sun Grid Engine style).

mod qstat;

pub use qstat::parse_qstat;

use std::path::Path;
use std::process::Stdio;

use stagehand_core::{CapturedOutput, QueueSnapshot};
use thiserror::Error;

use crate::subprocess::exit_code;

/// Errors from talking to the scheduler binaries
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with code {exit_code}: {stderr}")]
    Failed { program: String, exit_code: i32, stderr: String },
}

/// Submission and queue introspection.
///
/// `submit` only runs the submission binary and returns its raw output;
/// interpreting the acknowledgement is the dispatcher's job. A non-zero exit
/// is returned as output, not as an error, so the caller can surface it.
pub trait Scheduler: Send + Sync {
    /// Program name used for submission, for rendering the audit recipe.
    fn submit_program(&self) -> &str;

    fn submit(&self, args: &[String], cwd: &Path) -> Result<CapturedOutput, SchedulerError>;

    /// Current live-job listing.
    fn snapshot(&self) -> Result<QueueSnapshot, SchedulerError>;
}

/// `qsub` / `qstat` on the local PATH (or configured paths).
#[derive(Debug, Clone)]
pub struct SgeScheduler {
    qsub: String,
    qstat: String,
    qstat_args: Vec<String>,
}

impl SgeScheduler {
    pub fn new(qsub: impl Into<String>, qstat: impl Into<String>) -> Self {
        Self { qsub: qsub.into(), qstat: qstat.into(), qstat_args: Vec::new() }
    }

    /// Extra arguments for every `qstat` call (e.g. `-u someone`).
    pub fn with_qstat_args(mut self, args: Vec<String>) -> Self {
        self.qstat_args = args;
        self
    }
}

impl Default for SgeScheduler {
    fn default() -> Self {
        Self::new("qsub", "qstat")
    }
}

impl Scheduler for SgeScheduler {
    fn submit_program(&self) -> &str {
        &self.qsub
    }

    fn submit(&self, args: &[String], cwd: &Path) -> Result<CapturedOutput, SchedulerError> {
        tracing::debug!(program = %self.qsub, ?args, "running submission");
        run(&self.qsub, args, Some(cwd))
    }

    fn snapshot(&self) -> Result<QueueSnapshot, SchedulerError> {
        let output = run(&self.qstat, &self.qstat_args, None)?;
        if output.exit_code != 0 {
            return Err(SchedulerError::Failed {
                program: self.qstat.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(parse_qstat(&output.stdout))
    }
}

fn run(program: &str, args: &[String], cwd: Option<&Path>) -> Result<CapturedOutput, SchedulerError> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .map_err(|source| SchedulerError::Spawn { program: program.to_string(), source })?;
    Ok(CapturedOutput {
        exit_code: exit_code(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScheduler, SubmitCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
