// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn absent_ids_are_done() {
    let snap: QueueSnapshot =
        [(JobId(1), JobState::Running), (JobId(2), JobState::Waiting)].into_iter().collect();
    assert_eq!(snap.state(JobId(1)), JobState::Running);
    assert_eq!(snap.state(JobId(2)), JobState::Waiting);
    assert_eq!(snap.state(JobId(3)), JobState::Done);
    assert!(!snap.contains(JobId(3)));
    assert_eq!(snap.len(), 2);
}

#[test]
fn running_task_wins_over_waiting_task() {
    let mut snap = QueueSnapshot::new();
    snap.insert(JobId(7), JobState::Waiting);
    snap.insert(JobId(7), JobState::Running);
    snap.insert(JobId(7), JobState::Waiting);
    assert_eq!(snap.state(JobId(7)), JobState::Running);
    assert_eq!(snap.len(), 1);
}

#[test]
fn done_entries_are_not_stored() {
    let mut snap = QueueSnapshot::new();
    snap.insert(JobId(9), JobState::Done);
    assert!(snap.is_empty());
}

#[yare::parameterized(
    waiting = { JobState::Waiting, "waiting" },
    running = { JobState::Running, "running" },
    done    = { JobState::Done,    "done" },
)]
fn job_state_display(state: JobState, expected: &str) {
    assert_eq!(state.to_string(), expected);
}
