// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-until-absent job monitor.
//!
//! Each watched job moves `Waiting -> Running -> Done`. `Done` is inferred
//! when the id is missing from a fresh queue snapshot and is terminal; it
//! says the job is no longer observable, not that it succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stagehand_adapters::Scheduler;
use stagehand_core::{format_elapsed, Clock, JobId, JobState};

use crate::error::MonitorError;

/// Counts reported after each poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStatus {
    pub iteration: u64,
    pub total: usize,
    pub waiting: usize,
    pub running: usize,
    pub done: usize,
    pub elapsed: Duration,
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} running, {} waiting, {}/{} done [{}] (poll {})",
            self.running,
            self.waiting,
            self.done,
            self.total,
            format_elapsed(self.elapsed.as_secs()),
            self.iteration
        )
    }
}

/// What the monitor saw of one job before it went away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    pub seen_waiting: bool,
    pub seen_running: bool,
    /// Poll iteration at which the job was first absent
    pub done_at: Option<u64>,
}

impl Observation {
    /// False when the id never appeared in any snapshot. Such a job may have
    /// finished between submission and the first poll, or never registered.
    pub fn was_observed(&self) -> bool {
        self.seen_waiting || self.seen_running
    }
}

/// Outcome of a completed wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSummary {
    pub total: usize,
    pub iterations: u64,
    pub elapsed: Duration,
    pub snapshot_failures: u64,
    pub observations: BTreeMap<JobId, Observation>,
}

impl WaitSummary {
    pub fn was_observed(&self, id: JobId) -> bool {
        self.observations.get(&id).is_some_and(Observation::was_observed)
    }

    /// Ids that were never seen waiting or running.
    pub fn never_observed(&self) -> Vec<JobId> {
        self.observations.iter().filter(|(_, o)| !o.was_observed()).map(|(id, _)| *id).collect()
    }
}

/// Receives the status line after every poll.
pub trait ProgressSink: Send {
    fn update(&mut self, status: &PollStatus);

    fn finish(&mut self, _status: &PollStatus) {}
}

/// Rewrites one stderr line in place on a terminal; logs otherwise.
#[derive(Debug)]
pub struct TerminalStatusLine {
    is_tty: bool,
}

impl TerminalStatusLine {
    pub fn new() -> Self {
        Self { is_tty: std::io::stderr().is_terminal() }
    }
}

impl Default for TerminalStatusLine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalStatusLine {
    fn update(&mut self, status: &PollStatus) {
        if self.is_tty {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r\x1b[2K{}", status);
            let _ = err.flush();
        } else {
            tracing::info!(
                running = status.running,
                waiting = status.waiting,
                done = status.done,
                total = status.total,
                elapsed_s = status.elapsed.as_secs(),
                iteration = status.iteration,
                "waiting for jobs"
            );
        }
    }

    fn finish(&mut self, _status: &PollStatus) {
        if self.is_tty {
            let _ = writeln!(std::io::stderr());
        }
    }
}

/// Progress sink that keeps every update, for tests and callers that
/// render progress themselves.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    updates: Arc<Mutex<Vec<PollStatus>>>,
    finished: Arc<Mutex<Option<PollStatus>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<PollStatus> {
        self.updates.lock().clone()
    }

    pub fn finished(&self) -> Option<PollStatus> {
        self.finished.lock().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&mut self, status: &PollStatus) {
        self.updates.lock().push(status.clone());
    }

    fn finish(&mut self, status: &PollStatus) {
        *self.finished.lock() = Some(status.clone());
    }
}

/// Waits for a set of scheduler jobs to leave the queue.
pub struct JobMonitor<S, C> {
    scheduler: S,
    clock: C,
    poll_interval: Duration,
    progress: Mutex<Box<dyn ProgressSink>>,
}

impl<S: Scheduler, C: Clock> JobMonitor<S, C> {
    pub fn new(scheduler: S, clock: C, poll_interval: Duration) -> Self {
        Self {
            scheduler,
            clock,
            poll_interval,
            progress: Mutex::new(Box::new(TerminalStatusLine::new())),
        }
    }

    pub fn with_progress(self, sink: impl ProgressSink + 'static) -> Self {
        Self { progress: Mutex::new(Box::new(sink)), ..self }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Block until every id is absent from the queue. Never gives up.
    pub fn wait_for_completion(&self, ids: &[JobId]) -> WaitSummary {
        let (summary, _) = self.poll(ids, None);
        summary
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion), but give up
    /// once `deadline` has elapsed with jobs still queued.
    pub fn wait_until(
        &self,
        ids: &[JobId],
        deadline: Option<Duration>,
    ) -> Result<WaitSummary, MonitorError> {
        let (summary, outstanding) = self.poll(ids, deadline);
        if outstanding.is_empty() {
            Ok(summary)
        } else {
            Err(MonitorError::DeadlineExceeded { elapsed: summary.elapsed, outstanding })
        }
    }

    /// Poll loop. Returns the ids still outstanding, empty on completion.
    fn poll(&self, ids: &[JobId], deadline: Option<Duration>) -> (WaitSummary, Vec<JobId>) {
        let watched: BTreeSet<JobId> = ids.iter().copied().collect();
        let mut observations: BTreeMap<JobId, Observation> =
            watched.iter().map(|id| (*id, Observation::default())).collect();
        let mut states: BTreeMap<JobId, JobState> =
            watched.iter().map(|id| (*id, JobState::Waiting)).collect();
        let total = watched.len();
        let started = self.clock.now();
        let mut iterations = 0u64;
        let mut snapshot_failures = 0u64;

        if total == 0 {
            let summary = WaitSummary {
                total,
                iterations,
                elapsed: Duration::ZERO,
                snapshot_failures,
                observations,
            };
            return (summary, Vec::new());
        }

        tracing::info!(
            jobs = total,
            interval_ms = self.poll_interval.as_millis() as u64,
            "monitoring jobs"
        );

        loop {
            iterations += 1;
            match self.scheduler.snapshot() {
                Ok(snapshot) => {
                    for (id, state) in states.iter_mut() {
                        if state.is_done() {
                            continue;
                        }
                        let next = snapshot.state(*id);
                        let seen = observations.entry(*id).or_default();
                        match next {
                            JobState::Waiting => {
                                if *state == JobState::Running {
                                    tracing::debug!(job_id = %id, "job returned to waiting");
                                }
                                seen.seen_waiting = true;
                            }
                            JobState::Running => seen.seen_running = true,
                            JobState::Done => {
                                seen.done_at = Some(iterations);
                                tracing::debug!(
                                    job_id = %id,
                                    observed = seen.was_observed(),
                                    "job left the queue"
                                );
                            }
                        }
                        *state = next;
                    }
                }
                Err(e) => {
                    snapshot_failures += 1;
                    tracing::warn!(
                        error = %e,
                        iteration = iterations,
                        "queue snapshot failed, will retry"
                    );
                }
            }

            let status = self.status(&states, iterations, started);
            self.progress.lock().update(&status);

            let outstanding: Vec<JobId> =
                states.iter().filter(|(_, s)| !s.is_done()).map(|(id, _)| *id).collect();
            let expired = deadline.is_some_and(|limit| status.elapsed >= limit);
            if outstanding.is_empty() || expired {
                self.progress.lock().finish(&status);
                if outstanding.is_empty() {
                    tracing::info!(
                        jobs = total,
                        iterations,
                        elapsed_s = status.elapsed.as_secs(),
                        "all jobs left the queue"
                    );
                } else {
                    tracing::warn!(
                        outstanding = outstanding.len(),
                        elapsed_s = status.elapsed.as_secs(),
                        "wait deadline exceeded"
                    );
                }
                let summary = WaitSummary {
                    total,
                    iterations,
                    elapsed: status.elapsed,
                    snapshot_failures,
                    observations,
                };
                return (summary, outstanding);
            }

            self.clock.sleep(self.poll_interval);
        }
    }

    fn status(
        &self,
        states: &BTreeMap<JobId, JobState>,
        iteration: u64,
        started: std::time::Instant,
    ) -> PollStatus {
        let mut waiting = 0;
        let mut running = 0;
        for state in states.values() {
            match state {
                JobState::Waiting => waiting += 1,
                JobState::Running => running += 1,
                JobState::Done => {}
            }
        }
        let total = states.len();
        PollStatus {
            iteration,
            total,
            waiting,
            running,
            done: total - waiting - running,
            elapsed: self.clock.now().saturating_duration_since(started),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
