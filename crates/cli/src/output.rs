// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use stagehand_core::{format_elapsed_ms, JobHandle};
use stagehand_engine::{StageReport, WaitSummary};

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a stage report in text or JSON format.
pub fn print_report(report: &StageReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for line in report.render().lines() {
                println!("{}", color::report_line(line, report.overall_success));
            }
            Ok(())
        }
        OutputFormat::Json => print_json(report),
    }
}

/// Print a submitted job: the bare id in text mode.
pub fn print_submission(handle: &JobHandle, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", handle.id);
            Ok(())
        }
        OutputFormat::Json => print_json(handle),
    }
}

#[derive(Debug, Serialize)]
pub struct WaitOutput {
    pub total: usize,
    pub iterations: u64,
    pub elapsed_ms: u64,
    pub snapshot_failures: u64,
    pub never_observed: Vec<u64>,
}

impl From<&WaitSummary> for WaitOutput {
    fn from(summary: &WaitSummary) -> Self {
        Self {
            total: summary.total,
            iterations: summary.iterations,
            elapsed_ms: summary.elapsed.as_millis() as u64,
            snapshot_failures: summary.snapshot_failures,
            never_observed: summary.never_observed().into_iter().map(|id| id.get()).collect(),
        }
    }
}

/// One-line text summary of a finished wait.
pub fn format_wait(output: &WaitOutput) -> String {
    let mut line = format!(
        "{} job(s) left the queue after {} ({} poll(s))",
        output.total,
        format_elapsed_ms(output.elapsed_ms),
        output.iterations
    );
    if output.snapshot_failures > 0 {
        line.push_str(&format!(", {} failed snapshot(s)", output.snapshot_failures));
    }
    if !output.never_observed.is_empty() {
        let ids: Vec<String> = output.never_observed.iter().map(u64::to_string).collect();
        line.push_str(&format!("; never observed: {}", ids.join(", ")));
    }
    line
}

pub fn print_wait(summary: &WaitSummary, format: OutputFormat) -> anyhow::Result<()> {
    let output = WaitOutput::from(summary);
    match format {
        OutputFormat::Text => {
            println!("{}", format_wait(&output));
            Ok(())
        }
        OutputFormat::Json => print_json(&output),
    }
}
