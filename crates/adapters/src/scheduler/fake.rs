// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Scheduler, SchedulerError};
use parking_lot::Mutex;
use stagehand_core::{CapturedOutput, QueueSnapshot};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl SubmitCall {
    /// Value following `flag` in the recorded argv, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

struct FakeSchedulerState {
    submit_replies: VecDeque<CapturedOutput>,
    snapshots: VecDeque<Result<QueueSnapshot, String>>,
    next_id: u64,
    submits: Vec<SubmitCall>,
    snapshot_calls: usize,
}

/// Fake scheduler that records submissions and replays queue snapshots.
///
/// Unscripted submissions are acknowledged with increasing job ids starting
/// at 1000. Snapshots are consumed in order; the last one repeats forever,
/// and with none scripted the queue is empty.
#[derive(Clone)]
pub struct FakeScheduler {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl Default for FakeScheduler {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSchedulerState {
                submit_replies: VecDeque::new(),
                snapshots: VecDeque::new(),
                next_id: 1000,
                submits: Vec::new(),
                snapshot_calls: 0,
            })),
        }
    }
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply for the next submission.
    pub fn push_submit_reply(&self, reply: CapturedOutput) {
        self.inner.lock().submit_replies.push_back(reply);
    }

    /// Queue the next snapshot.
    pub fn push_snapshot(&self, snapshot: QueueSnapshot) {
        self.inner.lock().snapshots.push_back(Ok(snapshot));
    }

    /// Queue a failing `qstat` call.
    pub fn push_snapshot_error(&self, stderr: &str) {
        self.inner.lock().snapshots.push_back(Err(stderr.to_string()));
    }

    /// All submissions in call order
    pub fn submits(&self) -> Vec<SubmitCall> {
        self.inner.lock().submits.clone()
    }

    pub fn snapshot_calls(&self) -> usize {
        self.inner.lock().snapshot_calls
    }
}

impl Scheduler for FakeScheduler {
    fn submit_program(&self) -> &str {
        "qsub"
    }

    fn submit(&self, args: &[String], cwd: &Path) -> Result<CapturedOutput, SchedulerError> {
        let mut state = self.inner.lock();
        let call = SubmitCall { args: args.to_vec(), cwd: cwd.to_path_buf() };
        let name = call.flag_value("-N").unwrap_or("job").to_string();
        state.submits.push(call);
        if let Some(reply) = state.submit_replies.pop_front() {
            return Ok(reply);
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok(CapturedOutput::new(
            0,
            format!("Your job {} (\"{}\") has been submitted\n", id, name),
            "",
        ))
    }

    fn snapshot(&self) -> Result<QueueSnapshot, SchedulerError> {
        let mut state = self.inner.lock();
        state.snapshot_calls += 1;
        let next = if state.snapshots.len() > 1 {
            state.snapshots.pop_front()
        } else {
            state.snapshots.front().cloned()
        };
        match next {
            None => Ok(QueueSnapshot::new()),
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(stderr)) => {
                Err(SchedulerError::Failed { program: "qstat".to_string(), exit_code: 1, stderr })
            }
        }
    }
}
