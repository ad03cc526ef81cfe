// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster dispatch specs against stub `qsub`/`qstat` scripts.
//!
//! The stub `qsub` runs an inline job synchronously (writing its `-o`/`-e`
//! logs) and acknowledges with its own pid as the job id. The stub `qstat`
//! reports an empty queue, so every job is done on the first poll.

use std::os::unix::fs::PermissionsExt;

use crate::prelude::*;

const QSUB: &str = r#"#!/bin/sh
eval "job=\${$#}"
name=job
while [ $# -gt 0 ]; do
  case "$1" in
    -N) name="$2"; shift ;;
    -o) out="$2"; shift ;;
    -e) err="$2"; shift ;;
  esac
  shift
done
/bin/sh -c "$job" >"$out" 2>"$err"
echo "Your job $$ (\"$name\") has been submitted"
"#;

const QSUB_REJECT: &str = r#"#!/bin/sh
echo "Unable to run job: denied: host is not a submit host" >&2
exit 1
"#;

const QSTAT_EMPTY: &str = "#!/bin/sh\nexit 0\n";

const BATCH: &str = r#"
name = "call"

[[command]]
item = "s1"
run = "echo called s1"

[[command]]
item = "s2"
run = "echo 'samtools: truncated file' >&2; exit 3"

[[command]]
item = "s3"
run = "echo called s3"
"#;

fn script(temp: &Project, rel: &str, body: &str) -> String {
    let path = temp.file(rel, body);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

/// A project whose config points at the stub scheduler and allows `head01`.
fn cluster_project(qsub: &str) -> Project {
    let temp = Project::empty();
    let qsub = script(&temp, "bin/qsub", qsub);
    let qstat = script(&temp, "bin/qstat", QSTAT_EMPTY);
    temp.file(
        "config.toml",
        &format!(
            r#"
[cluster]
submit_hosts = ["head01.cluster.local"]
qsub = "{qsub}"
qstat = "{qstat}"
interpreter = "/bin/sh"
audit_dir = "logs"
sentinel_dir = "logs/exit"

[[cluster.queue]]
name = "all.q"
max_slots = 4

[monitor]
poll_interval_ms = 10
"#
        ),
    );
    temp
}

fn on_head_node(builder: CliBuilder) -> CliBuilder {
    builder.env("STAGEHAND_HOSTNAME", "head01")
}

#[test]
fn cluster_stage_reports_failing_job() {
    let temp = cluster_project(QSUB);
    temp.file("batch.toml", BATCH);
    on_head_node(temp.stagehand())
        .args(&["stage", "batch.toml", "--cluster", "-q", "all.q", "--slots", "16"])
        .code(1)
        .stdout_has("FAILED s2: exit code 3 (job ")
        .stdout_has("  | samtools: truncated file")
        .stdout_has("call: 2 succeeded, 1 failed of 3");

    let recipe = std::fs::read_to_string(temp.path().join("logs/sh_s1.recipe")).unwrap();
    assert!(recipe.contains("-q all.q"), "{recipe}");
    assert!(recipe.contains("-pe smp 4"), "{recipe}");
    let ack = std::fs::read_to_string(temp.path().join("logs/sh_s1.qsub.log")).unwrap();
    assert!(ack.contains("has been submitted"), "{ack}");
}

#[test]
fn advisory_cluster_stage_passes() {
    let temp = cluster_project(QSUB);
    temp.file("batch.toml", BATCH);
    on_head_node(temp.stagehand())
        .args(&["stage", "batch.toml", "--cluster", "-q", "all.q", "--advisory"])
        .passes()
        .stdout_has("FAILED s2");
}

#[test]
fn rerun_uses_fresh_job_files() {
    let temp = cluster_project(QSUB);
    temp.file("batch.toml", BATCH);
    for _ in 0..2 {
        on_head_node(temp.stagehand())
            .args(&["stage", "batch.toml", "--cluster", "-q", "all.q"])
            .code(1)
            .stdout_has("call: 2 succeeded, 1 failed of 3");
    }
    let logs = temp.path().join("logs");
    assert!(logs.join("sh_s1.recipe").exists());
    assert!(logs.join("sh_s1-2.recipe").exists());
    assert!(logs.join("exit/sh_s2-2.exit").exists());
    let first = std::fs::read_to_string(logs.join("sh_s1.out")).unwrap();
    assert_eq!(first, "called s1\n");
}

#[test]
fn unauthorized_host_cannot_submit() {
    let temp = cluster_project(QSUB);
    temp.stagehand()
        .env("STAGEHAND_HOSTNAME", "laptop")
        .args(&["submit", "-q", "all.q", "-c", "true"])
        .code(2)
        .stderr_has("not an authorized submit host");
    assert!(!temp.path().join("logs").exists());
}

#[test]
fn unknown_queue_is_refused() {
    let temp = cluster_project(QSUB);
    on_head_node(temp.stagehand())
        .args(&["submit", "-q", "gpu.q", "-c", "true"])
        .code(2)
        .stderr_has("unknown queue \"gpu.q\"");
}

#[test]
fn submit_prints_job_id() {
    let temp = cluster_project(QSUB);
    let run = on_head_node(temp.stagehand())
        .args(&["submit", "-q", "all.q", "-c", "echo hi", "--item", "s9"])
        .passes();
    let id = run.stdout();
    assert!(id.trim().parse::<u64>().is_ok(), "{id:?}");
}

#[test]
fn rejected_submission_keeps_the_scheduler_log() {
    let temp = cluster_project(QSUB_REJECT);
    on_head_node(temp.stagehand())
        .args(&["submit", "-q", "all.q", "-c", "true", "--name", "recheck"])
        .code(2)
        .stderr_has("rejected the submission");
    let log = std::fs::read_to_string(temp.path().join("logs/recheck.qsub.log")).unwrap();
    assert!(log.contains("not a submit host"), "{log}");
}

#[test]
fn wait_returns_once_queue_is_empty() {
    let temp = cluster_project(QSUB);
    temp.stagehand()
        .args(&["wait", "101", "102"])
        .passes()
        .stdout_has("2 job(s) left the queue")
        .stderr_has("job 101 was never observed");
}

#[test]
fn wait_rejects_non_numeric_ids() {
    cli().args(&["wait", "abc"]).code(2);
}
