// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading specs

use crate::prelude::*;

const BATCH: &str = r#"
name = "noop"

[[command]]
item = "a"
run = "true"
"#;

#[test]
fn unparsable_config_exits_two() {
    let temp = Project::empty();
    temp.file("config.toml", "[local\nmax_workers = ");
    temp.file("batch.toml", BATCH);
    temp.stagehand().args(&["run", "batch.toml"]).code(2).stderr_has("config.toml");
}

#[test]
fn unknown_config_key_exits_two() {
    let temp = Project::empty();
    temp.file("config.toml", "[local]\nworkers = 4\n");
    temp.file("batch.toml", BATCH);
    temp.stagehand().args(&["run", "batch.toml"]).code(2);
}

#[test]
fn zero_workers_is_rejected() {
    let temp = Project::empty();
    temp.file("config.toml", "[local]\nmax_workers = 0\n");
    temp.file("batch.toml", BATCH);
    temp.stagehand().args(&["run", "batch.toml"]).code(2).stderr_has("max_workers");
}

#[test]
fn missing_explicit_config_exits_two() {
    let temp = Project::empty();
    temp.file("batch.toml", BATCH);
    temp.stagehand().args(&["--config", "nope.toml", "run", "batch.toml"]).code(2);
}

#[test]
fn env_override_applies_without_a_file() {
    let temp = Project::empty();
    temp.file("batch.toml", BATCH);
    temp.stagehand().env("STAGEHAND_MAX_WORKERS", "1").args(&["run", "batch.toml"]).passes();
}
