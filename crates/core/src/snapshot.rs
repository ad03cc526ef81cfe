// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time view of the scheduler queue.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::JobId;

/// Per-job state as tracked by the monitor.
///
/// `Done` is never reported by the scheduler. It is inferred when an id is
/// absent from a fresh snapshot and means "no longer observable", not
/// "succeeded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Running,
    Done,
}

crate::simple_display! {
    JobState {
        Waiting => "waiting",
        Running => "running",
        Done => "done",
    }
}

impl JobState {
    pub fn is_done(self) -> bool {
        matches!(self, JobState::Done)
    }
}

/// Live jobs known to the scheduler at one instant.
///
/// Only `Waiting` and `Running` entries are ever stored. Built fresh for each
/// poll iteration and dropped afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    jobs: HashMap<JobId, JobState>,
}

impl QueueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live job. Array jobs can list one id several times; a
    /// running task wins over a waiting one. `Done` entries are ignored.
    pub fn insert(&mut self, id: JobId, state: JobState) {
        if state.is_done() {
            return;
        }
        let entry = self.jobs.entry(id).or_insert(state);
        if state == JobState::Running {
            *entry = JobState::Running;
        }
    }

    /// State of `id` in this snapshot; absent ids are `Done`.
    pub fn state(&self, id: JobId) -> JobState {
        self.jobs.get(&id).copied().unwrap_or(JobState::Done)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobId, JobState)> + '_ {
        self.jobs.iter().map(|(id, state)| (*id, *state))
    }
}

impl FromIterator<(JobId, JobState)> for QueueSnapshot {
    fn from_iter<I: IntoIterator<Item = (JobId, JobState)>>(iter: I) -> Self {
        let mut snapshot = QueueSnapshot::new();
        for (id, state) in iter {
            snapshot.insert(id, state);
        }
        snapshot
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
