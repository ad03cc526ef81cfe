// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler job identity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Command, WorkItemId};

/// Scheduler-assigned job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job id: {0:?}")]
pub struct JobIdParseError(pub String);

impl FromStr for JobId {
    type Err = JobIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(JobId).map_err(|_| JobIdParseError(s.to_string()))
    }
}

/// A command that the cluster scheduler accepted.
///
/// Created only by the cluster dispatcher. Completion of the job is inferred
/// from its absence in a queue snapshot; the handle itself carries no status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: JobId,
    pub item: WorkItemId,
    pub command: Command,
    /// SGE job name (`-N`)
    pub name: String,
    pub queue: String,
    /// Slot count actually requested, after clamping
    pub slots: u32,
    pub submitted_at_ms: u64,
    /// Literal submission command line, for replay
    pub recipe_path: PathBuf,
    /// Raw acknowledgement text from the submission binary
    pub scheduler_log_path: PathBuf,
    /// Job stdout (`-o`)
    pub stdout_path: PathBuf,
    /// Job stderr (`-e`)
    pub stderr_path: PathBuf,
    /// Exit-code sentinel written by the wrapped command, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel_path: Option<PathBuf>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
