// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatchable command model.
//!
//! A [`Command`] is an opaque shell invocation built by the templating layer.
//! The dispatch core never looks inside the invocation string; it only runs
//! it (locally or on the cluster) and judges the outcome.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::WorkItemId;

/// Which captured stream a text marker is searched in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStream {
    #[default]
    Stdout,
    Stderr,
    Either,
}

crate::simple_display! {
    MarkerStream {
        Stdout => "stdout",
        Stderr => "stderr",
        Either => "either",
    }
}

impl MarkerStream {
    /// Whether `needle` appears in the stream(s) this variant names.
    pub fn contains(self, needle: &str, stdout: &str, stderr: &str) -> bool {
        match self {
            MarkerStream::Stdout => stdout.contains(needle),
            MarkerStream::Stderr => stderr.contains(needle),
            MarkerStream::Either => stdout.contains(needle) || stderr.contains(needle),
        }
    }
}

/// Literal text markers for tools whose exit code cannot be trusted.
///
/// Some wrapped tools return 0 after a logical failure and only say so in
/// their output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    /// Substring that must be present for the command to count as succeeded.
    #[serde(default, rename = "success_marker", skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    /// Substring whose presence marks the command as failed, whatever its exit code.
    #[serde(default, rename = "failure_marker", skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(default, rename = "marker_stream")]
    pub stream: MarkerStream,
}

impl Markers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_none() && self.failure.is_none()
    }

    /// The configured failure marker, if it appears in the captured output.
    pub fn failure_hit(&self, stdout: &str, stderr: &str) -> Option<&str> {
        self.failure
            .as_deref()
            .filter(|marker| self.stream.contains(marker, stdout, stderr))
    }

    /// The configured success marker, if it does *not* appear in the captured output.
    pub fn success_missing(&self, stdout: &str, stderr: &str) -> Option<&str> {
        self.success
            .as_deref()
            .filter(|marker| !self.stream.contains(marker, stdout, stderr))
    }

    /// Whether the configured success marker appears in the captured output.
    pub fn success_hit(&self, stdout: &str, stderr: &str) -> bool {
        self.success
            .as_deref()
            .is_some_and(|marker| self.stream.contains(marker, stdout, stderr))
    }
}

/// One shell invocation plus where to run it and how to judge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub item: WorkItemId,
    /// The literal shell invocation, passed to `<shell> -c`.
    #[serde(rename = "run")]
    pub invocation: String,
    #[serde(default = "default_cwd")]
    pub cwd: PathBuf,
    #[serde(flatten)]
    pub markers: Markers,
    /// Paths the command is expected to produce, for post-hoc artifact checks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PathBuf>,
}

fn default_cwd() -> PathBuf {
    PathBuf::from(".")
}

impl Command {
    pub fn new(item: impl Into<WorkItemId>, invocation: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            invocation: invocation.into(),
            cwd: default_cwd(),
            markers: Markers::none(),
            outputs: Vec::new(),
        }
    }

    crate::setters! {
        into { cwd: PathBuf }
        set { markers: Markers, outputs: Vec<PathBuf> }
    }

    pub fn success_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.success = Some(marker.into());
        self
    }

    pub fn failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.failure = Some(marker.into());
        self
    }

    pub fn marker_stream(mut self, stream: MarkerStream) -> Self {
        self.markers.stream = stream;
        self
    }

    /// Short form for log fields: `item=<id>`
    pub fn log(&self) -> String {
        format!("item={}", self.item)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
