// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of running one command.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Command, MarkerStream};

/// Number of trailing lines kept when quoting captured output in reports.
pub const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Raw process output before any verdict is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self { exit_code, stdout: stdout.into(), stderr: stderr.into() }
    }

    /// Output for a process that could not be started at all.
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self { exit_code: -1, stdout: String::new(), stderr: message.into() }
    }
}

/// Why a command was judged failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    /// The base strategy rejected the exit code.
    ExitCode(i32),
    /// The configured failure marker appeared in the output.
    FailureMarker(String),
    /// The configured success marker never appeared.
    MissingSuccessMarker(String),
    /// The process could not be spawned.
    SpawnFailed(String),
    /// An expected output file is missing or empty.
    MissingOutput(String),
    /// Cancellation tripped before the command started.
    Cancelled,
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::ExitCode(code) => write!(f, "exit code {}", code),
            FailureCause::FailureMarker(m) => write!(f, "failure marker {:?} found", m),
            FailureCause::MissingSuccessMarker(m) => write!(f, "success marker {:?} missing", m),
            FailureCause::SpawnFailed(e) => write!(f, "spawn failed: {}", e),
            FailureCause::MissingOutput(p) => write!(f, "output {} missing or empty", p),
            FailureCause::Cancelled => f.write_str("cancelled before start"),
        }
    }
}

/// The outcome of running one [`Command`] locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: Command,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Derived from the exit code and the command's markers; never set directly.
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl ExecutionResult {
    /// Result for a command that was never started.
    pub fn cancelled(command: Command) -> Self {
        Self {
            command,
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            succeeded: false,
            cause: Some(FailureCause::Cancelled),
            duration: Duration::ZERO,
        }
    }

    /// Tail of the captured output most relevant to the failure.
    ///
    /// Stdout when the failure marker lives there, otherwise stderr, falling
    /// back to stdout when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let marker_on_stdout = matches!(self.cause, Some(FailureCause::FailureMarker(_)))
            && self.command.markers.stream != MarkerStream::Stderr
            && self
                .command
                .markers
                .failure
                .as_deref()
                .is_some_and(|m| self.stdout.contains(m));
        let text = if marker_on_stdout || self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        tail_lines(text, DIAGNOSTIC_TAIL_LINES)
    }
}

/// Last `n` lines of `text`, trimmed of surrounding whitespace.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n").trim().to_string()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
