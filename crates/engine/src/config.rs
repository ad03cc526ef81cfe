// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the local pool, the cluster dispatcher and the monitor.
//!
//! ```toml
//! [local]
//! max_workers = 8
//!
//! [cluster]
//! submit_hosts = ["submit01.cluster"]
//! audit_dir = "logs/qsub"
//!
//! [[cluster.queue]]
//! name = "all.q"
//! max_slots = 56
//!
//! [monitor]
//! poll_interval_ms = 1000
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::ConfigError;

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub local: LocalConfig,
    pub cluster: ClusterConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalConfig {
    /// Upper bound on concurrently running local commands
    pub max_workers: usize,
    /// Shell used to run invocations (`<shell> -c <invocation>`)
    pub shell: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            shell: PathBuf::from("/bin/sh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    pub name: String,
    /// Slot ceiling for a single job in this queue
    pub max_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Hosts allowed to submit; full or short names
    pub submit_hosts: Vec<String>,
    #[serde(rename = "queue")]
    pub queues: Vec<QueueConfig>,
    pub qsub: String,
    pub qstat: String,
    pub qstat_args: Vec<String>,
    /// Parallel environment passed to `-pe`
    pub parallel_env: String,
    /// Appended to every submission before the command
    pub extra_args: Vec<String>,
    /// Default interpreter for `-S` and inline `-b y` commands
    pub interpreter: PathBuf,
    /// Recipes, acknowledgements and job stdout/stderr logs
    pub audit_dir: PathBuf,
    /// When set, inline jobs record their exit code here
    pub sentinel_dir: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            submit_hosts: Vec::new(),
            queues: Vec::new(),
            qsub: "qsub".to_string(),
            qstat: "qstat".to_string(),
            qstat_args: Vec::new(),
            parallel_env: "smp".to_string(),
            extra_args: Vec::new(),
            interpreter: PathBuf::from("/bin/bash"),
            audit_dir: PathBuf::from("stagehand-logs"),
            sentinel_dir: None,
        }
    }
}

impl ClusterConfig {
    pub fn queue(&self, name: &str) -> Option<&QueueConfig> {
        self.queues.iter().find(|q| q.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 1000 }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Resolve, read, override from the environment, and validate.
    ///
    /// Lookup: `explicit` > `STAGEHAND_CONFIG` > `<config dir>/config.toml`
    /// (only if it exists) > built-in defaults. An explicitly named file that
    /// cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let path = match named {
            Some(path) => Some(path),
            None => env::config_dir().map(|d| d.join(CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                tracing::debug!(path = %path.display(), "loaded config");
                Self::from_toml(&text, &path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text; `path` is only used for error messages.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(interval) = env::poll_interval() {
            self.monitor.poll_interval_ms = interval.as_millis() as u64;
        }
        if let Some(workers) = env::max_workers() {
            self.local.max_workers = workers;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local.max_workers == 0 {
            return Err(ConfigError::Invalid("local.max_workers must be at least 1".into()));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("monitor.poll_interval_ms must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for queue in &self.cluster.queues {
            if queue.name.trim().is_empty() {
                return Err(ConfigError::Invalid("queue name must not be empty".into()));
            }
            if queue.max_slots == 0 {
                return Err(ConfigError::Invalid(format!(
                    "queue {:?} has max_slots = 0",
                    queue.name
                )));
            }
            if !seen.insert(queue.name.as_str()) {
                return Err(ConfigError::Invalid(format!("queue {:?} defined twice", queue.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
