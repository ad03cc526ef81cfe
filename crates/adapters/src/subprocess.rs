// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous child-process execution for local work items.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use stagehand_core::CapturedOutput;

/// Runs one shell invocation to completion and captures its output.
///
/// Called from several pool workers at once, so implementations must not
/// share mutable state between calls without synchronising it.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &str, cwd: &Path) -> std::io::Result<CapturedOutput>;
}

/// Runs invocations as `<shell> -c <invocation>` with stdin closed.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self { shell: shell.into() }
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, invocation: &str, cwd: &Path) -> std::io::Result<CapturedOutput> {
        let output = std::process::Command::new(&self.shell)
            .arg("-c")
            .arg(invocation)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(CapturedOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Exit code of a finished process; signal deaths map to `128 + signal`.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::ProcessRunner;
    use parking_lot::Mutex;
    use stagehand_core::CapturedOutput;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RunCall {
        pub invocation: String,
        pub cwd: PathBuf,
    }

    /// Scripted reply for one invocation
    #[derive(Debug, Clone, Default)]
    pub struct FakeResponse {
        pub output: CapturedOutput,
        /// Wall-clock time the fake "process" occupies a worker
        pub delay: Duration,
        /// Simulate a spawn failure instead of returning output
        pub spawn_error: Option<String>,
    }

    impl FakeResponse {
        pub fn exit(code: i32) -> Self {
            Self { output: CapturedOutput::new(code, "", ""), ..Self::default() }
        }

        pub fn output(code: i32, stdout: &str, stderr: &str) -> Self {
            Self { output: CapturedOutput::new(code, stdout, stderr), ..Self::default() }
        }

        pub fn spawn_error(message: &str) -> Self {
            Self { spawn_error: Some(message.to_string()), ..Self::default() }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[derive(Default)]
    struct FakeRunnerState {
        responses: HashMap<String, FakeResponse>,
        default_delay: Duration,
        calls: Vec<RunCall>,
        in_flight: usize,
        peak_in_flight: usize,
    }

    /// Fake process runner that replays scripted responses.
    ///
    /// Unscripted invocations exit 0 with empty output. Tracks how many
    /// invocations were running at once so pool bounds can be asserted.
    #[derive(Clone, Default)]
    pub struct FakeProcessRunner {
        inner: Arc<Mutex<FakeRunnerState>>,
    }

    impl FakeProcessRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the reply for an exact invocation string.
        pub fn respond(&self, invocation: &str, response: FakeResponse) -> &Self {
            self.inner.lock().responses.insert(invocation.to_string(), response);
            self
        }

        /// Delay applied to unscripted invocations.
        pub fn set_default_delay(&self, delay: Duration) {
            self.inner.lock().default_delay = delay;
        }

        /// All invocations in the order they started
        pub fn calls(&self) -> Vec<RunCall> {
            self.inner.lock().calls.clone()
        }

        /// Highest number of invocations observed running at once
        pub fn peak_concurrency(&self) -> usize {
            self.inner.lock().peak_in_flight
        }
    }

    impl ProcessRunner for FakeProcessRunner {
        fn run(&self, invocation: &str, cwd: &Path) -> std::io::Result<CapturedOutput> {
            let response = {
                let mut state = self.inner.lock();
                state.calls.push(RunCall {
                    invocation: invocation.to_string(),
                    cwd: cwd.to_path_buf(),
                });
                state.in_flight += 1;
                state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
                let default_delay = state.default_delay;
                state
                    .responses
                    .get(invocation)
                    .cloned()
                    .unwrap_or_else(|| FakeResponse::exit(0).with_delay(default_delay))
            };

            if !response.delay.is_zero() {
                std::thread::sleep(response.delay);
            }
            self.inner.lock().in_flight -= 1;

            match response.spawn_error {
                Some(message) => Err(std::io::Error::new(std::io::ErrorKind::NotFound, message)),
                None => Ok(response.output),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessRunner, FakeResponse, RunCall};

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
