// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stagehand_adapters::FakeScheduler;
use stagehand_core::test_support::snapshot;
use stagehand_core::FakeClock;

const POLL: Duration = Duration::from_secs(5);

fn monitor(scheduler: &FakeScheduler, clock: &FakeClock) -> (JobMonitor<FakeScheduler, FakeClock>, RecordingProgress) {
    let progress = RecordingProgress::new();
    let monitor =
        JobMonitor::new(scheduler.clone(), clock.clone(), POLL).with_progress(progress.clone());
    (monitor, progress)
}

fn ids(raw: &[u64]) -> Vec<JobId> {
    raw.iter().copied().map(JobId).collect()
}

#[test]
fn returns_only_after_every_id_is_absent() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running), (2, JobState::Waiting)]));
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&ids(&[1, 2, 3]));

    let updates = progress.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!((updates[0].running, updates[0].waiting, updates[0].done), (1, 1, 1));
    assert_eq!(updates[0].total, 3);
    assert_eq!((updates[1].running, updates[1].waiting, updates[1].done), (0, 0, 3));
    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.total, 3);
    assert_eq!(scheduler.snapshot_calls(), 2);
    assert_eq!(clock.sleeps(), vec![POLL]);
    assert_eq!(summary.elapsed, POLL);
}

#[test]
fn empty_id_set_returns_without_polling() {
    let scheduler = FakeScheduler::new();
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&[]);

    assert_eq!(summary.total, 0);
    assert_eq!(summary.iterations, 0);
    assert_eq!(scheduler.snapshot_calls(), 0);
    assert!(progress.updates().is_empty());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn tracks_waiting_then_running_then_done() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(7, JobState::Waiting)]));
    scheduler.push_snapshot(snapshot(&[(7, JobState::Running)]));
    scheduler.push_snapshot(snapshot(&[(7, JobState::Running)]));
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&ids(&[7]));

    let observation = summary.observations[&JobId(7)];
    assert!(observation.seen_waiting);
    assert!(observation.seen_running);
    assert_eq!(observation.done_at, Some(4));
    assert!(summary.never_observed().is_empty());
    assert_eq!(progress.finished().map(|s| s.done), Some(1));
    assert_eq!(clock.sleeps().len(), 3);
}

#[test]
fn done_is_terminal() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running)]));
    // Job 2 leaves, then an id reuse would show it again
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running), (2, JobState::Running)]));
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    monitor.wait_for_completion(&ids(&[1, 2]));

    let updates = progress.updates();
    assert_eq!(updates[0].done, 1);
    assert_eq!(updates[1].done, 1);
    assert_eq!(updates[1].running, 1);
}

#[test]
fn never_observed_ids_are_flagged() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running)]));
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, _) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&ids(&[1, 2]));

    assert!(summary.was_observed(JobId(1)));
    assert!(!summary.was_observed(JobId(2)));
    assert_eq!(summary.never_observed(), vec![JobId(2)]);
}

#[test]
fn snapshot_failures_are_counted_and_waiting_continues() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running)]));
    scheduler.push_snapshot_error("error: failed receiving gdi request");
    scheduler.push_snapshot_error("error: failed receiving gdi request");
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&ids(&[1]));

    assert_eq!(summary.snapshot_failures, 2);
    assert_eq!(summary.iterations, 4);
    // The failed polls keep the last known state
    assert_eq!(progress.updates()[1].running, 1);
}

#[test]
fn duplicate_ids_are_watched_once() {
    let scheduler = FakeScheduler::new();
    let clock = FakeClock::new();
    let (monitor, _) = monitor(&scheduler, &clock);

    let summary = monitor.wait_for_completion(&ids(&[4, 4, 5]));

    assert_eq!(summary.total, 2);
    assert_eq!(summary.iterations, 1);
}

#[test]
fn deadline_reports_outstanding_ids() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running), (2, JobState::Waiting)]));
    let clock = FakeClock::new();
    let (monitor, progress) = monitor(&scheduler, &clock);

    let err = monitor.wait_until(&ids(&[1, 2, 3]), Some(Duration::from_secs(12))).unwrap_err();

    let MonitorError::DeadlineExceeded { elapsed, outstanding } = err;
    assert_eq!(outstanding, ids(&[1, 2]));
    assert_eq!(elapsed, Duration::from_secs(15));
    assert_eq!(scheduler.snapshot_calls(), 4);
    assert!(progress.finished().is_some());
}

#[test]
fn deadline_not_hit_returns_summary() {
    let scheduler = FakeScheduler::new();
    scheduler.push_snapshot(snapshot(&[(1, JobState::Running)]));
    scheduler.push_snapshot(snapshot(&[]));
    let clock = FakeClock::new();
    let (monitor, _) = monitor(&scheduler, &clock);

    let summary = monitor.wait_until(&ids(&[1]), Some(Duration::from_secs(60))).unwrap();
    assert_eq!(summary.iterations, 2);
}

#[test]
fn status_line_format() {
    let status = PollStatus {
        iteration: 12,
        total: 8,
        waiting: 2,
        running: 3,
        done: 3,
        elapsed: Duration::from_secs(187),
    };
    assert_eq!(status.to_string(), "3 running, 2 waiting, 3/8 done [3m07s] (poll 12)");
}
