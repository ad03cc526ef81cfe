// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("stage")
        .stdout_has("submit")
        .stdout_has("wait");
}

#[test]
fn stage_help_shows_cluster_options() {
    cli()
        .args(&["stage", "--help"])
        .passes()
        .stdout_has("--cluster")
        .stdout_has("--queue")
        .stdout_has("--probe");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn submit_requires_command_or_file() {
    cli().args(&["submit", "--queue", "all.q"]).code(2);
}
