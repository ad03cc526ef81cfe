// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::time::Duration;

use crate::{
    classify, CapturedOutput, Command, ExecutionResult, ExitCodeVerdict, JobHandle, JobId,
    JobState, QueueSnapshot,
};

/// Build an [`ExecutionResult`] the way the local executor would.
pub fn execution_result(command: Command, exit_code: i32, stdout: &str, stderr: &str) -> ExecutionResult {
    let output = CapturedOutput::new(exit_code, stdout, stderr);
    let verdict = classify(&command, &output, &ExitCodeVerdict);
    ExecutionResult {
        command,
        exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        succeeded: verdict.is_success(),
        cause: verdict.cause(),
        duration: Duration::from_millis(10),
    }
}

/// Snapshot from `(id, state)` pairs.
pub fn snapshot(jobs: &[(u64, JobState)]) -> QueueSnapshot {
    jobs.iter().map(|(id, state)| (JobId(*id), *state)).collect()
}

/// A job handle whose artifact paths live under `dir`.
pub fn job_handle(id: u64, command: Command, dir: &std::path::Path) -> JobHandle {
    let name = format!("sh_{}", command.item);
    JobHandle {
        id: JobId(id),
        item: command.item.clone(),
        command,
        stdout_path: dir.join(format!("{}.out", name)),
        stderr_path: dir.join(format!("{}.err", name)),
        recipe_path: dir.join(format!("{}.recipe", name)),
        scheduler_log_path: dir.join(format!("{}.qsub.log", name)),
        sentinel_path: Some(dir.join(format!("{}.exit", name))),
        name,
        queue: "all.q".to_string(),
        slots: 1,
        submitted_at_ms: 1_000_000,
    }
}

