// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers: a scratch project directory and a fluent runner.

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

/// A temporary working directory with its own config.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// A project with an empty config (no submit hosts, no queues).
    pub fn empty() -> Self {
        let project = Self { dir: tempfile::tempdir().unwrap() };
        project.file("config.toml", "");
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// `stagehand` run inside the project, reading the project's config.
    pub fn stagehand(&self) -> CliBuilder {
        cli()
            .current_dir(self.path())
            .env("STAGEHAND_CONFIG", self.path().join("config.toml"))
    }
}

/// `stagehand` with a scrubbed environment.
pub fn cli() -> CliBuilder {
    let mut cmd = Command::cargo_bin("stagehand").unwrap();
    for var in ["STAGEHAND_CONFIG", "STAGEHAND_POLL_MS", "STAGEHAND_MAX_WORKERS", "STAGEHAND_HOSTNAME"]
    {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd.env("STAGEHAND_LOG", "off");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> RunAssert {
        self.code(0)
    }

    /// Run and require a non-zero exit code.
    pub fn fails(mut self) -> RunAssert {
        let run = RunAssert { output: self.cmd.output().unwrap() };
        assert!(!run.output.status.success(), "expected failure\n{}", run.describe());
        run
    }

    pub fn code(mut self, expected: i32) -> RunAssert {
        let run = RunAssert { output: self.cmd.output().unwrap() };
        assert_eq!(run.output.status.code(), Some(expected), "{}", run.describe());
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout lacks {needle:?}\n{}", self.describe());
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout().contains(needle), "stdout has {needle:?}\n{}", self.describe());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr lacks {needle:?}\n{}", self.describe());
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }

    fn describe(&self) -> String {
        format!(
            "status: {:?}\n--- stdout\n{}\n--- stderr\n{}",
            self.output.status.code(),
            self.stdout(),
            self.stderr()
        )
    }
}
