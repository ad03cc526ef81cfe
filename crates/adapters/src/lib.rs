// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stagehand-adapters: seams to processes, the batch scheduler, and the host

pub mod host;
pub mod scheduler;
pub mod subprocess;

pub use host::{HostResolver, SystemHost};
pub use scheduler::{parse_qstat, Scheduler, SchedulerError, SgeScheduler};
pub use subprocess::{ProcessRunner, ShellRunner};

#[cfg(any(test, feature = "test-support"))]
pub use host::FakeHost;
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::{FakeScheduler, SubmitCall};
#[cfg(any(test, feature = "test-support"))]
pub use subprocess::{FakeProcessRunner, FakeResponse, RunCall};
