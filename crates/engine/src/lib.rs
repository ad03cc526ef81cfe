// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stagehand-engine: local pool, cluster dispatch, job monitoring and
//! stage verdicts

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod local;
pub mod monitor;
pub mod shell;
pub mod stage;

pub use aggregate::{
    aggregate, aggregate_jobs, ArtifactProbe, FailurePolicy, ItemStatus, ItemVerdict,
    LogMarkerProbe, OutcomeProbe, ProbeOutcome, SentinelProbe, StageReport,
};
pub use config::{ClusterConfig, Config, LocalConfig, MonitorConfig, QueueConfig};
pub use dispatch::{parse_job_id, ClusterDispatcher, Submission};
pub use error::{
    AggregationFailure, ConfigError, EngineError, ExecutionFailure, MonitorError,
    PartialSubmission, SubmissionError,
};
pub use local::{CancelToken, LocalExecutor};
pub use monitor::{
    JobMonitor, Observation, PollStatus, ProgressSink, RecordingProgress, TerminalStatusLine,
    WaitSummary,
};
pub use stage::{DispatchMode, Engine, Stage, SystemEngine};
