// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn shell_runner_captures_stdout_stderr_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = ShellRunner::default()
        .run("echo out; echo err >&2; exit 3", dir.path())
        .unwrap();
    assert_eq!(out.exit_code, 3);
    assert_eq!(out.stdout, "out\n");
    assert_eq!(out.stderr, "err\n");
}

#[test]
fn shell_runner_runs_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let out = ShellRunner::default().run("cat marker.txt", dir.path()).unwrap();
    assert_eq!(out.exit_code, 0);
    assert_eq!(out.stdout, "here");
}

#[test]
fn shell_runner_reports_signal_deaths_above_128() {
    let dir = tempfile::tempdir().unwrap();
    let out = ShellRunner::default().run("kill -9 $$", dir.path()).unwrap();
    assert_eq!(out.exit_code, 128 + 9);
}

#[test]
fn shell_runner_missing_shell_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ShellRunner::new("/nonexistent/shell").run("true", dir.path());
    assert!(result.is_err());
}

#[test]
fn shell_runner_missing_cwd_is_io_error() {
    let result = ShellRunner::default().run("true", Path::new("/nonexistent/dir/for/test"));
    assert!(result.is_err());
}

#[test]
fn fake_runner_replays_scripted_responses_and_records_calls() {
    let fake = FakeProcessRunner::new();
    fake.respond("bad", FakeResponse::output(1, "", "boom"));
    fake.respond("gone", FakeResponse::spawn_error("no such tool"));

    let ok = fake.run("anything", Path::new("/w")).unwrap();
    let bad = fake.run("bad", Path::new("/w")).unwrap();
    let gone = fake.run("gone", Path::new("/w"));

    assert_eq!(ok.exit_code, 0);
    assert_eq!(bad.exit_code, 1);
    assert_eq!(bad.stderr, "boom");
    assert!(gone.is_err());
    let invocations: Vec<String> = fake.calls().into_iter().map(|c| c.invocation).collect();
    assert_eq!(invocations, vec!["anything", "bad", "gone"]);
}

#[test]
fn fake_runner_tracks_peak_concurrency() {
    let fake = FakeProcessRunner::new();
    fake.set_default_delay(Duration::from_millis(50));
    std::thread::scope(|s| {
        for i in 0..3 {
            let fake = fake.clone();
            s.spawn(move || fake.run(&format!("job {}", i), Path::new("/w")));
        }
    });
    assert!(fake.peak_concurrency() >= 1);
    assert!(fake.peak_concurrency() <= 3);
    assert_eq!(fake.calls().len(), 3);
}
