// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod run;
pub mod stage;
pub mod submit;
pub mod wait;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use stagehand_engine::{EngineError, FailurePolicy, Stage, StageReport};

use crate::exit_error::ExitError;
use crate::output::{print_report, OutputFormat};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// Load and validate a batch file; any problem is a usage error.
pub(crate) fn load_stage(path: &Path) -> Result<Stage> {
    Stage::load(path).map_err(|e| ExitError::usage(e.to_string()).into())
}

pub(crate) fn policy(advisory: bool) -> FailurePolicy {
    if advisory {
        FailurePolicy::Advisory
    } else {
        FailurePolicy::Strict
    }
}

pub(crate) fn timeout(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Print the outcome of a stage and map it to an exit status.
pub(crate) fn conclude(
    outcome: Result<StageReport, EngineError>,
    format: OutputFormat,
) -> Result<()> {
    let report = outcome.map_err(engine_exit)?;
    print_report(&report, format)?;
    if report.should_proceed() {
        return Ok(());
    }
    Err(ExitError::stage_failed(report.aggregation_failure().to_string()).into())
}

/// A deadline means the stage did not pass; anything else never got going.
pub(crate) fn engine_exit(err: EngineError) -> anyhow::Error {
    match err {
        EngineError::Monitor(e) => ExitError::stage_failed(e.to_string()).into(),
        EngineError::Aggregation(e) => ExitError::stage_failed(e.to_string()).into(),
        EngineError::Submission(partial) => {
            let mut message = partial.to_string();
            if !partial.submitted.is_empty() {
                let ids: Vec<String> = partial.submitted.iter().map(|j| j.id.to_string()).collect();
                message.push_str(&format!(" (already queued: {})", ids.join(" ")));
            }
            ExitError::usage(message).into()
        }
        EngineError::Config(e) => ExitError::usage(e.to_string()).into(),
    }
}
