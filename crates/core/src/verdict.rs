// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Success classification for captured command output.
//!
//! A [`VerdictStrategy`] judges the raw process outcome. Marker evidence from
//! the command is always applied on top by [`classify`], so a strategy can
//! make a verdict stricter or looser about exit codes but can never let a
//! configured failure marker slip through.

use serde::{Deserialize, Serialize};

use crate::{CapturedOutput, Command, FailureCause};

/// Verdict for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Succeeded,
    Failed(FailureCause),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Succeeded)
    }

    pub fn cause(self) -> Option<FailureCause> {
        match self {
            Verdict::Succeeded => None,
            Verdict::Failed(cause) => Some(cause),
        }
    }
}

/// Base judgement of a finished process.
pub trait VerdictStrategy: Send + Sync {
    fn judge(&self, output: &CapturedOutput) -> Verdict;
}

impl<F> VerdictStrategy for F
where
    F: Fn(&CapturedOutput) -> Verdict + Send + Sync,
{
    fn judge(&self, output: &CapturedOutput) -> Verdict {
        self(output)
    }
}

/// `exit_code == 0` means success.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCodeVerdict;

impl VerdictStrategy for ExitCodeVerdict {
    fn judge(&self, output: &CapturedOutput) -> Verdict {
        if output.exit_code == 0 {
            Verdict::Succeeded
        } else {
            Verdict::Failed(FailureCause::ExitCode(output.exit_code))
        }
    }
}

/// Any exit code in the list means success.
///
/// For tools that exit non-zero on benign outcomes (e.g. "no hits").
#[derive(Debug, Clone, Default)]
pub struct AcceptedExitCodes(pub Vec<i32>);

impl VerdictStrategy for AcceptedExitCodes {
    fn judge(&self, output: &CapturedOutput) -> Verdict {
        if self.0.contains(&output.exit_code) {
            Verdict::Succeeded
        } else {
            Verdict::Failed(FailureCause::ExitCode(output.exit_code))
        }
    }
}

/// Classify a finished command.
///
/// Precedence: a present failure marker fails the command whatever the exit
/// code; then the base strategy; then a configured success marker must be
/// present.
pub fn classify(
    command: &Command,
    output: &CapturedOutput,
    strategy: &dyn VerdictStrategy,
) -> Verdict {
    let markers = &command.markers;
    if let Some(marker) = markers.failure_hit(&output.stdout, &output.stderr) {
        return Verdict::Failed(FailureCause::FailureMarker(marker.to_string()));
    }
    if let Verdict::Failed(cause) = strategy.judge(output) {
        return Verdict::Failed(cause);
    }
    if let Some(marker) = markers.success_missing(&output.stdout, &output.stderr) {
        return Verdict::Failed(FailureCause::MissingSuccessMarker(marker.to_string()));
    }
    Verdict::Succeeded
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod tests;
