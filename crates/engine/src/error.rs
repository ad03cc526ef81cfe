// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use stagehand_core::{FailureCause, JobHandle, JobId, WorkItemId};
use thiserror::Error;

/// Submission to the cluster scheduler did not produce a job.
///
/// Every variant means nothing was queued for that command.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("host {host:?} is not an authorized submit host (allowed: {})", allowed.join(", "))]
    HostNotAuthorized { host: String, allowed: Vec<String> },

    #[error("could not determine host name: {0}")]
    HostLookup(#[source] std::io::Error),

    #[error("unknown queue {0:?}")]
    UnknownQueue(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} rejected the submission (exit {exit_code}): {stderr}")]
    Rejected { program: String, exit_code: i32, stderr: String },

    #[error("no job id in submission acknowledgement: {output:?}")]
    MissingAcknowledgement { output: String },

    #[error("failed to write {}: {source}", path.display())]
    Audit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command file {} is not usable: {source}", path.display())]
    CommandFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A batch submission stopped part way.
///
/// `submitted` holds the jobs already queued before `error`; they are live
/// and can still be waited on.
#[derive(Debug, Error)]
#[error("submission stopped after {} job(s): {error}", submitted.len())]
pub struct PartialSubmission {
    pub submitted: Vec<JobHandle>,
    #[source]
    pub error: SubmissionError,
}

/// Per-item failure record carried in stage reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{item}: {cause}")]
pub struct ExecutionFailure {
    pub item: WorkItemId,
    /// The invocation that failed
    pub command: String,
    pub cause: FailureCause,
    /// Tail of the relevant captured output
    pub diagnostic: String,
}

/// A stage failed under the strict policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage {stage:?} failed: {failed} failed, {unconfirmed} unconfirmed of {total}")]
pub struct AggregationFailure {
    pub stage: String,
    pub failed: usize,
    pub unconfirmed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("gave up after {elapsed:?} with {} job(s) outstanding", outstanding.len())]
    DeadlineExceeded { elapsed: Duration, outstanding: Vec<JobId> },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Anything that can stop a stage from producing a report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submission(#[from] PartialSubmission),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Aggregation(#[from] AggregationFailure),
}
