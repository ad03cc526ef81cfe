// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded local worker pool.
//!
//! Workers are scoped threads that claim the next unstarted index from a
//! shared counter and run one command at a time. Each worker hands back its
//! `(index, result)` pairs through its join handle, so results are placed in
//! input order without any locking.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use stagehand_adapters::ProcessRunner;
use stagehand_core::{
    classify, CapturedOutput, Command, ExecutionResult, ExitCodeVerdict, FailureCause, Verdict,
    VerdictStrategy,
};

/// Effective pool size for a batch: `min(requested, batch)`, at least 1 for
/// a non-empty batch.
pub fn pool_size_for(requested: usize, batch: usize) -> usize {
    if batch == 0 {
        return 0;
    }
    requested.clamp(1, batch)
}

/// Cooperative cancellation flag, checked between invocations only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs batches of commands on this host.
pub struct LocalExecutor<R> {
    runner: R,
    verdict: Box<dyn VerdictStrategy>,
}

impl<R: ProcessRunner> LocalExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner, verdict: Box::new(ExitCodeVerdict) }
    }

    /// Replace the base exit-code judgement. Markers still apply on top.
    pub fn with_verdict(mut self, verdict: impl VerdictStrategy + 'static) -> Self {
        self.verdict = Box::new(verdict);
        self
    }

    /// Run every command to completion; one result per command, in order.
    pub fn run_local(&self, commands: &[Command], pool_size: usize) -> Vec<ExecutionResult> {
        self.run_local_cancellable(commands, pool_size, &CancelToken::new())
    }

    /// Like [`run_local`](Self::run_local), but commands not yet started when
    /// `cancel` trips are recorded as cancelled instead of run.
    pub fn run_local_cancellable(
        &self,
        commands: &[Command],
        pool_size: usize,
        cancel: &CancelToken,
    ) -> Vec<ExecutionResult> {
        let workers = pool_size_for(pool_size, commands.len());
        if workers == 0 {
            return Vec::new();
        }
        tracing::info!(count = commands.len(), workers, "running local batch");

        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<ExecutionResult>> = (0..commands.len()).map(|_| None).collect();

        std::thread::scope(|scope| {
            let next = &next;
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut finished = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(command) = commands.get(index) else {
                                break;
                            };
                            let result = if cancel.is_cancelled() {
                                tracing::debug!(item = %command.item, "skipped, cancelled");
                                ExecutionResult::cancelled(command.clone())
                            } else {
                                self.execute_guarded(command)
                            };
                            finished.push((index, result));
                        }
                        finished
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(finished) => {
                        for (index, result) in finished {
                            slots[index] = Some(result);
                        }
                    }
                    Err(_) => tracing::error!("local worker panicked"),
                }
            }
        });

        slots
            .into_iter()
            .zip(commands)
            .map(|(slot, command)| {
                slot.unwrap_or_else(|| {
                    let cause = FailureCause::SpawnFailed("worker panicked".to_string());
                    let output = CapturedOutput::spawn_failure("worker panicked");
                    self.record(command, output, Verdict::Failed(cause), Instant::now())
                })
            })
            .collect()
    }

    /// [`execute`](Self::execute), with a panic in the runner or verdict
    /// confined to this one command.
    fn execute_guarded(&self, command: &Command) -> ExecutionResult {
        let started = Instant::now();
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.execute(command))) {
            Ok(result) => result,
            Err(payload) => {
                let message = format!("worker panicked: {}", panic_message(payload.as_ref()));
                tracing::error!(item = %command.item, %message, "command panicked");
                let verdict = Verdict::Failed(FailureCause::SpawnFailed(message.clone()));
                self.record(command, CapturedOutput::spawn_failure(message), verdict, started)
            }
        }
    }

    /// Run one command synchronously and judge it.
    pub fn execute(&self, command: &Command) -> ExecutionResult {
        let started = Instant::now();
        tracing::debug!(item = %command.item, invocation = %command.invocation, "starting");
        match self.runner.run(&command.invocation, &command.cwd) {
            Ok(output) => {
                let verdict = classify(command, &output, self.verdict.as_ref());
                self.record(command, output, verdict, started)
            }
            Err(e) => {
                tracing::warn!(item = %command.item, error = %e, "failed to spawn");
                let verdict = Verdict::Failed(FailureCause::SpawnFailed(e.to_string()));
                self.record(command, CapturedOutput::spawn_failure(e.to_string()), verdict, started)
            }
        }
    }

    fn record(
        &self,
        command: &Command,
        output: CapturedOutput,
        verdict: Verdict,
        started: Instant,
    ) -> ExecutionResult {
        let duration = started.elapsed();
        let succeeded = verdict.is_success();
        if succeeded {
            tracing::debug!(
                item = %command.item,
                exit_code = output.exit_code,
                elapsed_ms = duration.as_millis() as u64,
                "finished"
            );
        } else {
            tracing::warn!(
                item = %command.item,
                exit_code = output.exit_code,
                elapsed_ms = duration.as_millis() as u64,
                "command failed"
            );
        }
        ExecutionResult {
            command: command.clone(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            succeeded,
            cause: verdict.cause(),
            duration,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
