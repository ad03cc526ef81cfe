// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item and per-stage verdicts.
//!
//! The local path judges items from their [`ExecutionResult`]s. The cluster
//! path has no captured output, so each finished job is inspected after the
//! fact through an [`OutcomeProbe`].

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagehand_core::result::{tail_lines, DIAGNOSTIC_TAIL_LINES};
use stagehand_core::{
    classify, CapturedOutput, ExecutionResult, ExitCodeVerdict, FailureCause, JobHandle, JobId,
    MarkerStream, Verdict, VerdictStrategy, WorkItemId,
};

use crate::error::{AggregationFailure, ExecutionFailure};
use crate::monitor::WaitSummary;

/// How per-item failures affect the stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed or unconfirmed item fails the stage.
    #[default]
    Strict,
    /// Report failures but let the pipeline continue.
    Advisory,
}

stagehand_core::simple_display! {
    FailurePolicy {
        Strict => "strict",
        Advisory => "advisory",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded,
    Failed,
    /// No evidence either way (cluster path only)
    Unconfirmed,
}

stagehand_core::simple_display! {
    ItemStatus {
        Succeeded => "succeeded",
        Failed => "failed",
        Unconfirmed => "unconfirmed",
    }
}

/// Verdict for one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemVerdict {
    pub item: WorkItemId,
    pub status: ItemStatus,
    /// The invocation behind this item
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
    /// Why an item could not be confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Aggregated outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub policy: FailurePolicy,
    pub items: Vec<ItemVerdict>,
    pub succeeded: usize,
    pub failed: usize,
    pub unconfirmed: usize,
    /// True only when every item succeeded, whatever the policy.
    pub overall_success: bool,
}

impl StageReport {
    fn new(items: Vec<ItemVerdict>, policy: FailurePolicy) -> Self {
        let count = |status| items.iter().filter(|v| v.status == status).count();
        let succeeded = count(ItemStatus::Succeeded);
        let failed = count(ItemStatus::Failed);
        let unconfirmed = count(ItemStatus::Unconfirmed);
        Self {
            stage: String::new(),
            policy,
            overall_success: failed == 0 && unconfirmed == 0,
            items,
            succeeded,
            failed,
            unconfirmed,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Items that did not succeed, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ItemVerdict> {
        self.items.iter().filter(|v| v.status != ItemStatus::Succeeded)
    }

    /// Whether the orchestrator should move on to the next stage.
    pub fn should_proceed(&self) -> bool {
        self.overall_success || self.policy == FailurePolicy::Advisory
    }

    /// The report, or an error when a strict stage did not fully succeed.
    pub fn into_result(self) -> Result<StageReport, AggregationFailure> {
        if self.should_proceed() {
            return Ok(self);
        }
        Err(self.aggregation_failure())
    }

    pub fn aggregation_failure(&self) -> AggregationFailure {
        AggregationFailure {
            stage: self.stage.clone(),
            failed: self.failed,
            unconfirmed: self.unconfirmed,
            total: self.total(),
        }
    }

    /// Human-readable report: each failing item with its diagnostics, then
    /// the counts.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for verdict in self.failures() {
            let label = match verdict.status {
                ItemStatus::Failed => "FAILED",
                _ => "UNCONFIRMED",
            };
            let why = match (&verdict.failure, &verdict.reason) {
                (Some(failure), _) => failure.cause.to_string(),
                (None, Some(reason)) => reason.clone(),
                (None, None) => "no evidence of completion".to_string(),
            };
            let _ = write!(out, "{} {}: {}", label, verdict.item, why);
            if let Some(id) = verdict.job_id {
                let _ = write!(out, " (job {})", id);
            }
            out.push('\n');
            let _ = writeln!(out, "  command: {}", verdict.command);
            for warning in &verdict.warnings {
                let _ = writeln!(out, "  warning: {}", warning);
            }
            if let Some(failure) = &verdict.failure {
                for line in failure.diagnostic.lines() {
                    let _ = writeln!(out, "  | {}", line);
                }
            }
        }
        let name = if self.stage.is_empty() { "stage" } else { self.stage.as_str() };
        let _ = write!(
            out,
            "{}: {} succeeded, {} failed",
            name, self.succeeded, self.failed
        );
        if self.unconfirmed > 0 {
            let _ = write!(out, ", {} unconfirmed", self.unconfirmed);
        }
        let _ = writeln!(out, " of {}", self.total());
        out
    }
}

/// Judge a local batch.
pub fn aggregate(results: &[ExecutionResult], policy: FailurePolicy) -> StageReport {
    let items = results
        .iter()
        .map(|result| {
            let failure = match (&result.cause, result.succeeded) {
                (_, true) => None,
                (Some(cause), false) => Some(cause.clone()),
                (None, false) => Some(FailureCause::ExitCode(result.exit_code)),
            }
            .map(|cause| ExecutionFailure {
                item: result.command.item.clone(),
                command: result.command.invocation.clone(),
                cause,
                diagnostic: result.diagnostic(),
            });
            ItemVerdict {
                item: result.command.item.clone(),
                status: if result.succeeded { ItemStatus::Succeeded } else { ItemStatus::Failed },
                command: result.command.invocation.clone(),
                job_id: None,
                exit_code: Some(result.exit_code),
                failure,
                reason: None,
                warnings: Vec::new(),
            }
        })
        .collect();
    let report = StageReport::new(items, policy);
    log_report(&report);
    report
}

/// Judge finished cluster jobs through `probe`.
///
/// Jobs the monitor never saw in the queue keep whatever the probe finds but
/// carry a warning; without positive evidence they stay unconfirmed.
pub fn aggregate_jobs(
    jobs: &[JobHandle],
    summary: &WaitSummary,
    probe: &dyn OutcomeProbe,
    policy: FailurePolicy,
) -> StageReport {
    let items = jobs
        .iter()
        .map(|job| {
            let mut warnings = Vec::new();
            if !summary.was_observed(job.id) {
                tracing::warn!(job_id = %job.id, item = %job.item, "job never observed in the queue");
                warnings.push(format!("job {} was never observed in the queue", job.id));
            }
            let mut verdict = ItemVerdict {
                item: job.item.clone(),
                status: ItemStatus::Unconfirmed,
                command: job.command.invocation.clone(),
                job_id: Some(job.id),
                exit_code: None,
                failure: None,
                reason: None,
                warnings,
            };
            match probe.probe(job) {
                ProbeOutcome::Succeeded { exit_code } => {
                    verdict.status = ItemStatus::Succeeded;
                    verdict.exit_code = exit_code;
                }
                ProbeOutcome::Failed { cause, exit_code, diagnostic } => {
                    verdict.status = ItemStatus::Failed;
                    verdict.exit_code = exit_code;
                    verdict.failure = Some(ExecutionFailure {
                        item: job.item.clone(),
                        command: job.command.invocation.clone(),
                        cause,
                        diagnostic,
                    });
                }
                ProbeOutcome::Unconfirmed(reason) => verdict.reason = Some(reason),
            }
            verdict
        })
        .collect();
    let report = StageReport::new(items, policy);
    log_report(&report);
    report
}

fn log_report(report: &StageReport) {
    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        unconfirmed = report.unconfirmed,
        overall_success = report.overall_success,
        policy = %report.policy,
        "stage verdict"
    );
}

/// What a probe found for one finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Succeeded { exit_code: Option<i32> },
    Failed { cause: FailureCause, exit_code: Option<i32>, diagnostic: String },
    Unconfirmed(String),
}

/// Post-hoc inspection of a job that has left the queue.
pub trait OutcomeProbe {
    fn probe(&self, job: &JobHandle) -> ProbeOutcome;
}

/// Reads the exit-code sentinel, then applies the command's markers to the
/// job's log files. Without a sentinel it falls back to markers alone.
pub struct SentinelProbe {
    verdict: Box<dyn VerdictStrategy>,
}

impl SentinelProbe {
    pub fn new() -> Self {
        Self { verdict: Box::new(ExitCodeVerdict) }
    }

    pub fn with_verdict(verdict: impl VerdictStrategy + 'static) -> Self {
        Self { verdict: Box::new(verdict) }
    }
}

impl Default for SentinelProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeProbe for SentinelProbe {
    fn probe(&self, job: &JobHandle) -> ProbeOutcome {
        let Some(exit_code) = job.sentinel_path.as_deref().and_then(read_sentinel) else {
            return LogMarkerProbe.probe(job);
        };
        let output = CapturedOutput::new(
            exit_code,
            read_log(&job.stdout_path),
            read_log(&job.stderr_path),
        );
        match classify(&job.command, &output, self.verdict.as_ref()) {
            Verdict::Succeeded => ProbeOutcome::Succeeded { exit_code: Some(exit_code) },
            Verdict::Failed(cause) => ProbeOutcome::Failed {
                diagnostic: log_diagnostic(job, &cause, &output),
                cause,
                exit_code: Some(exit_code),
            },
        }
    }
}

/// Judges a job from its log files and the command's markers only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMarkerProbe;

impl OutcomeProbe for LogMarkerProbe {
    fn probe(&self, job: &JobHandle) -> ProbeOutcome {
        let markers = &job.command.markers;
        if markers.is_empty() {
            return ProbeOutcome::Unconfirmed("no sentinel and no markers configured".to_string());
        }
        let output =
            CapturedOutput::new(0, read_log(&job.stdout_path), read_log(&job.stderr_path));
        if let Some(marker) = markers.failure_hit(&output.stdout, &output.stderr) {
            let cause = FailureCause::FailureMarker(marker.to_string());
            return ProbeOutcome::Failed {
                diagnostic: log_diagnostic(job, &cause, &output),
                cause,
                exit_code: None,
            };
        }
        if markers.success_hit(&output.stdout, &output.stderr) {
            return ProbeOutcome::Succeeded { exit_code: None };
        }
        ProbeOutcome::Unconfirmed("no marker found in job logs".to_string())
    }
}

/// Judges a job by the output files its command declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactProbe;

impl OutcomeProbe for ArtifactProbe {
    fn probe(&self, job: &JobHandle) -> ProbeOutcome {
        let outputs = &job.command.outputs;
        if outputs.is_empty() {
            return ProbeOutcome::Unconfirmed("no expected outputs declared".to_string());
        }
        for output in outputs {
            let path = resolve(&job.command.cwd, output);
            let present = std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
            if !present {
                return ProbeOutcome::Failed {
                    cause: FailureCause::MissingOutput(path.display().to_string()),
                    exit_code: None,
                    diagnostic: tail_lines(&read_log(&job.stderr_path), DIAGNOSTIC_TAIL_LINES),
                };
            }
        }
        ProbeOutcome::Succeeded { exit_code: None }
    }
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Exit code from a sentinel file; `None` when absent or unreadable.
fn read_sentinel(path: &Path) -> Option<i32> {
    let text = std::fs::read_to_string(path).ok()?;
    match text.trim().parse::<i32>() {
        Ok(code) => Some(code),
        Err(_) => {
            tracing::warn!(path = %path.display(), contents = %text.trim(), "unparseable exit sentinel");
            None
        }
    }
}

fn read_log(path: &Path) -> String {
    std::fs::read(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned()).unwrap_or_default()
}

fn log_diagnostic(job: &JobHandle, cause: &FailureCause, output: &CapturedOutput) -> String {
    let marker_on_stdout = matches!(cause, FailureCause::FailureMarker(m)
        if job.command.markers.stream != MarkerStream::Stderr && output.stdout.contains(m.as_str()));
    let text = if marker_on_stdout || output.stderr.trim().is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    tail_lines(text, DIAGNOSTIC_TAIL_LINES)
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
