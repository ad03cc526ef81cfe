// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;
use std::time::Duration;

/// Explicit config file path (`STAGEHAND_CONFIG`)
pub fn config_path() -> Option<PathBuf> {
    std::env::var("STAGEHAND_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Config directory: XDG_CONFIG_HOME/stagehand > ~/.config/stagehand
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("stagehand"));
        }
    }
    dirs::home_dir().map(|home| home.join(".config/stagehand"))
}

/// Poll interval override for the job monitor
pub fn poll_interval() -> Option<Duration> {
    std::env::var("STAGEHAND_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Local pool ceiling override
pub fn max_workers() -> Option<usize> {
    std::env::var("STAGEHAND_MAX_WORKERS").ok().and_then(|s| s.parse::<usize>().ok())
}

/// Host name override for the submit-host check.
pub fn hostname() -> Option<String> {
    std::env::var("STAGEHAND_HOSTNAME").ok().filter(|s| !s.is_empty())
}
