// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local pool stage specs

use crate::prelude::*;

const QC_BATCH: &str = r#"
name = "qc"

[[command]]
item = "s1"
run = "echo s1 ok"

[[command]]
item = "s2"
run = "echo s2 ok"

[[command]]
item = "s3"
run = "echo 'gzip: s3.fq.gz: unexpected end of file' >&2; exit 1"

[[command]]
item = "s4"
run = "echo s4 ok"

[[command]]
item = "s5"
run = "echo s5 ok"
"#;

#[test]
fn one_failure_fails_the_stage() {
    let temp = Project::empty();
    temp.file("batch.toml", QC_BATCH);
    temp.stagehand()
        .args(&["run", "batch.toml"])
        .code(1)
        .stdout_has("FAILED s3: exit code 1")
        .stdout_has("  | gzip: s3.fq.gz: unexpected end of file")
        .stdout_has("qc: 4 succeeded, 1 failed of 5")
        .stdout_lacks("FAILED s1")
        .stderr_has("stage \"qc\" failed");
}

#[test]
fn advisory_run_reports_but_passes() {
    let temp = Project::empty();
    temp.file("batch.toml", QC_BATCH);
    temp.stagehand()
        .args(&["run", "batch.toml", "--advisory"])
        .passes()
        .stdout_has("FAILED s3")
        .stdout_has("qc: 4 succeeded, 1 failed of 5");
}

#[test]
fn stage_without_cluster_runs_locally() {
    let temp = Project::empty();
    temp.file("batch.toml", QC_BATCH);
    temp.stagehand().args(&["stage", "batch.toml", "-j", "2"]).code(1).stdout_has("FAILED s3");
}

#[test]
fn json_report_lists_every_item_in_order() {
    let temp = Project::empty();
    temp.file("batch.toml", QC_BATCH);
    let run = temp.stagehand().args(&["run", "batch.toml", "--format", "json"]).code(1);
    let report = run.json();
    assert_eq!(report["stage"], "qc");
    assert_eq!(report["overall_success"], false);
    assert_eq!(report["succeeded"], 4);
    assert_eq!(report["failed"], 1);
    let items: Vec<&str> =
        report["items"].as_array().unwrap().iter().map(|i| i["item"].as_str().unwrap()).collect();
    assert_eq!(items, ["s1", "s2", "s3", "s4", "s5"]);
    assert_eq!(report["items"][2]["status"], "failed");
}

#[test]
fn markers_override_exit_status() {
    let temp = Project::empty();
    temp.file(
        "batch.toml",
        r#"
name = "align"

[[command]]
item = "s1"
run = "echo 'Exception in thread main' >&2"
failure_marker = "Exception"
marker_stream = "stderr"
"#,
    );
    temp.stagehand()
        .args(&["run", "batch.toml"])
        .code(1)
        .stdout_has("FAILED s1: failure marker \"Exception\" found");
}

#[test]
fn relative_cwd_resolves_against_batch_file() {
    let temp = Project::empty();
    temp.file("batches/work/input.txt", "reads\n");
    temp.file(
        "batches/batch.toml",
        r#"
name = "cwd"

[[command]]
item = "a"
run = "test -s input.txt"
cwd = "work"
"#,
    );
    temp.stagehand()
        .args(&["run", "batches/batch.toml"])
        .passes()
        .stdout_has("cwd: 1 succeeded, 0 failed of 1");
}

#[test]
fn duplicate_items_are_a_usage_error() {
    let temp = Project::empty();
    temp.file(
        "batch.toml",
        r#"
name = "dup"

[[command]]
item = "a"
run = "true"

[[command]]
item = "a"
run = "true"
"#,
    );
    temp.stagehand().args(&["run", "batch.toml"]).code(2).stderr_has("more than once");
}

#[test]
fn empty_batch_succeeds() {
    let temp = Project::empty();
    temp.file("batch.toml", "name = \"empty\"\n");
    temp.stagehand()
        .args(&["run", "batch.toml"])
        .passes()
        .stdout_has("empty: 0 succeeded, 0 failed of 0");
}
