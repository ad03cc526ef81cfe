// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission of work items to the cluster batch scheduler.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use stagehand_adapters::{HostResolver, Scheduler, SchedulerError};
use stagehand_core::{Clock, Command, JobHandle, JobId};

use crate::config::ClusterConfig;
use crate::error::{PartialSubmission, SubmissionError};
use crate::shell::{quote_arg, quote_args};

/// `Your job 4242 ("sh_s01") has been submitted`, also `job-array 4243.1-10:1`.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static ACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\byour\s+job(?:-array)?\s+(\d+)(?:\.[\d:-]+)?\b.*\bhas\s+been\s+submitted"#)
        .expect("constant regex pattern is valid")
});

/// What to hand to the scheduler.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Run the command's invocation through the interpreter (`-b y`).
    Inline(Command),
    /// Submit a prepared script. `command` supplies the item identity,
    /// working directory and markers.
    File { command: Command, path: PathBuf },
}

impl Submission {
    pub fn command(&self) -> &Command {
        match self {
            Submission::Inline(command) | Submission::File { command, .. } => command,
        }
    }
}

/// Extract the job id from the submission binary's stdout.
pub fn parse_job_id(stdout: &str) -> Option<JobId> {
    stdout
        .lines()
        .find_map(|line| ACK_PATTERN.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse::<u64>().ok())
        .map(JobId)
}

/// Clamp a requested slot count into `1..=ceiling`.
pub fn clamp_slots(requested: u32, ceiling: u32) -> u32 {
    requested.clamp(1, ceiling.max(1))
}

/// Whether `host` appears on the allow-list, by full or short name.
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    let short = short_name(host);
    allowed.iter().any(|entry| entry == host || entry == short || short_name(entry) == host)
}

fn short_name(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// Make a scheduler-safe job name: `[A-Za-z0-9_.-]`, not starting with a digit.
pub fn sanitize_job_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    match cleaned.chars().next() {
        None => "sh_job".to_string(),
        Some(c) if c.is_ascii_digit() => format!("sh_{}", cleaned),
        Some(_) => cleaned,
    }
}

/// Default job name for a work item.
pub fn job_name(command: &Command) -> String {
    sanitize_job_name(&format!("sh_{}", command.item))
}

/// Submits commands to the scheduler after the host and queue checks.
pub struct ClusterDispatcher<S, H, C> {
    scheduler: S,
    host: H,
    clock: C,
    config: ClusterConfig,
}

impl<S: Scheduler, H: HostResolver, C: Clock> ClusterDispatcher<S, H, C> {
    pub fn new(scheduler: S, host: H, clock: C, config: ClusterConfig) -> Self {
        Self { scheduler, host, clock, config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Fail unless this host is on the submit allow-list.
    pub fn authorize(&self) -> Result<(), SubmissionError> {
        let host = self.host.hostname().map_err(SubmissionError::HostLookup)?;
        if host_allowed(&host, &self.config.submit_hosts) {
            return Ok(());
        }
        tracing::warn!(host = %host, "submission refused, not a submit host");
        Err(SubmissionError::HostNotAuthorized { host, allowed: self.config.submit_hosts.clone() })
    }

    /// Submit one unit of work under its default job name.
    pub fn submit_cluster(
        &self,
        submission: Submission,
        queue: &str,
        slots: u32,
        interpreter: Option<&Path>,
    ) -> Result<JobHandle, SubmissionError> {
        self.submit_named(submission, None, queue, slots, interpreter)
    }

    /// Submit one unit of work, optionally overriding the job name.
    ///
    /// The recipe file is written before the scheduler is invoked and the
    /// raw acknowledgement after, whether or not it was accepted.
    pub fn submit_named(
        &self,
        submission: Submission,
        name: Option<&str>,
        queue: &str,
        slots: u32,
        interpreter: Option<&Path>,
    ) -> Result<JobHandle, SubmissionError> {
        self.authorize()?;
        let ceiling = self
            .config
            .queue(queue)
            .map(|q| q.max_slots)
            .ok_or_else(|| SubmissionError::UnknownQueue(queue.to_string()))?;
        let clamped = clamp_slots(slots, ceiling);
        if clamped != slots {
            tracing::debug!(queue, requested = slots, granted = clamped, "clamped slot request");
        }

        let command = submission.command().clone();
        let name = match name {
            Some(n) => sanitize_job_name(n),
            None => job_name(&command),
        };
        let interpreter = interpreter.unwrap_or(&self.config.interpreter).to_path_buf();

        let command_file = match &submission {
            Submission::File { path, .. } => {
                let path = absolute(path)?;
                std::fs::metadata(&path)
                    .map_err(|source| SubmissionError::CommandFile { path: path.clone(), source })?;
                Some(path)
            }
            Submission::Inline(_) => None,
        };

        let audit_dir = absolute(&self.config.audit_dir)?;
        create_dir(&audit_dir)?;
        let sentinel_dir = match (&submission, &self.config.sentinel_dir) {
            (Submission::Inline(_), Some(dir)) => {
                let dir = absolute(dir)?;
                create_dir(&dir)?;
                Some(dir)
            }
            _ => None,
        };
        let cwd = absolute(&command.cwd)?;
        let JobPaths { recipe_path, scheduler_log_path, stdout_path, stderr_path, sentinel_path } =
            JobPaths::claim(&audit_dir, sentinel_dir.as_deref(), &name)?;

        let mut args: Vec<String> = vec![
            "-q".into(),
            queue.to_string(),
            "-pe".into(),
            self.config.parallel_env.clone(),
            clamped.to_string(),
            "-S".into(),
            interpreter.display().to_string(),
            "-N".into(),
            name.clone(),
            "-wd".into(),
            cwd.display().to_string(),
            "-o".into(),
            stdout_path.display().to_string(),
            "-e".into(),
            stderr_path.display().to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());

        match &command_file {
            Some(path) => args.push(path.display().to_string()),
            None => {
                let invocation = match &sentinel_path {
                    Some(path) => wrap_with_sentinel(&command.invocation, path),
                    None => command.invocation.clone(),
                };
                args.extend([
                    "-b".into(),
                    "y".into(),
                    interpreter.display().to_string(),
                    "-c".into(),
                    invocation,
                ]);
            }
        }

        let program = self.scheduler.submit_program().to_string();
        let recipe = format!("{} {}\n", quote_arg(&program), quote_args(&args));
        write_audit(&recipe_path, &recipe)?;

        let output = self.scheduler.submit(&args, &cwd).map_err(|e| match e {
            SchedulerError::Spawn { program, source } => SubmissionError::Spawn { program, source },
            SchedulerError::Failed { program, exit_code, stderr } => {
                SubmissionError::Rejected { program, exit_code, stderr }
            }
        })?;
        write_audit(&scheduler_log_path, &format!("{}{}", output.stdout, output.stderr))?;

        if output.exit_code != 0 {
            tracing::warn!(
                item = %command.item,
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "submission rejected"
            );
            return Err(SubmissionError::Rejected {
                program,
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let id = parse_job_id(&output.stdout).ok_or_else(|| {
            SubmissionError::MissingAcknowledgement {
                output: format!("{}{}", output.stdout, output.stderr).trim().to_string(),
            }
        })?;

        tracing::info!(
            job_id = %id,
            item = %command.item,
            queue,
            slots = clamped,
            name = %name,
            "submitted"
        );

        Ok(JobHandle {
            id,
            item: command.item.clone(),
            command,
            name,
            queue: queue.to_string(),
            slots: clamped,
            submitted_at_ms: self.clock.epoch_ms(),
            recipe_path,
            scheduler_log_path,
            stdout_path,
            stderr_path,
            sentinel_path,
        })
    }

    /// Submit commands in order, stopping at the first failure.
    pub fn submit_all(
        &self,
        commands: &[Command],
        queue: &str,
        slots: u32,
        interpreter: Option<&Path>,
    ) -> Result<Vec<JobHandle>, PartialSubmission> {
        let mut submitted = Vec::with_capacity(commands.len());
        for command in commands {
            match self.submit_cluster(Submission::Inline(command.clone()), queue, slots, interpreter)
            {
                Ok(handle) => submitted.push(handle),
                Err(error) => {
                    tracing::warn!(
                        item = %command.item,
                        submitted = submitted.len(),
                        error = %error,
                        "batch submission stopped"
                    );
                    return Err(PartialSubmission { submitted, error });
                }
            }
        }
        Ok(submitted)
    }
}

/// `( <invocation> ); echo $? > <sentinel>`
pub fn wrap_with_sentinel(invocation: &str, sentinel: &Path) -> String {
    format!("( {} ); echo $? > {}", invocation, quote_arg(&sentinel.display().to_string()))
}

fn absolute(path: &Path) -> Result<PathBuf, SubmissionError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let base = std::env::current_dir()
        .map_err(|source| SubmissionError::Audit { path: path.to_path_buf(), source })?;
    let joined = base.join(path);
    // Drop `.` components so `-wd` stays readable
    Ok(joined.components().collect())
}

fn create_dir(dir: &Path) -> Result<(), SubmissionError> {
    std::fs::create_dir_all(dir)
        .map_err(|source| SubmissionError::Audit { path: dir.to_path_buf(), source })
}

/// Files owned by one submission.
struct JobPaths {
    recipe_path: PathBuf,
    scheduler_log_path: PathBuf,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    sentinel_path: Option<PathBuf>,
}

impl JobPaths {
    fn for_stem(audit_dir: &Path, sentinel_dir: Option<&Path>, stem: &str) -> Self {
        Self {
            recipe_path: audit_dir.join(format!("{}.recipe", stem)),
            scheduler_log_path: audit_dir.join(format!("{}.qsub.log", stem)),
            stdout_path: audit_dir.join(format!("{}.out", stem)),
            stderr_path: audit_dir.join(format!("{}.err", stem)),
            sentinel_path: sentinel_dir.map(|dir| dir.join(format!("{}.exit", stem))),
        }
    }

    fn existing(&self) -> bool {
        [&self.scheduler_log_path, &self.stdout_path, &self.stderr_path]
            .into_iter()
            .chain(self.sentinel_path.as_ref())
            .any(|path| path.exists())
    }

    /// Pick the first stem (`name`, `name-2`, `name-3`, ...) with no files
    /// from an earlier submission, and reserve it by creating the recipe.
    ///
    /// Job names are lossy, so two items (or a rerun) can share one; their
    /// logs and sentinels must never be shared.
    fn claim(
        audit_dir: &Path,
        sentinel_dir: Option<&Path>,
        name: &str,
    ) -> Result<Self, SubmissionError> {
        for attempt in 1u32.. {
            let stem =
                if attempt == 1 { name.to_string() } else { format!("{}-{}", name, attempt) };
            let paths = Self::for_stem(audit_dir, sentinel_dir, &stem);
            if paths.existing() {
                continue;
            }
            match std::fs::OpenOptions::new().write(true).create_new(true).open(&paths.recipe_path)
            {
                Ok(_) => {
                    if attempt > 1 {
                        tracing::debug!(name, stem = %stem, "job files taken, using new stem");
                    }
                    return Ok(paths);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(SubmissionError::Audit { path: paths.recipe_path, source })
                }
            }
        }
        Err(SubmissionError::Audit {
            path: audit_dir.to_path_buf(),
            source: std::io::Error::other("no free job file name"),
        })
    }
}

fn write_audit(path: &Path, contents: &str) -> Result<(), SubmissionError> {
    std::fs::write(path, contents)
        .map_err(|source| SubmissionError::Audit { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
