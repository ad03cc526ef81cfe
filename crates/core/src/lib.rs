// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stagehand-core: data model for dispatching pipeline-stage work

pub mod macros;

pub mod clock;
pub mod command;
pub mod job;
pub mod result;
pub mod snapshot;
pub mod time_fmt;
pub mod verdict;
pub mod work_item;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{Command, MarkerStream, Markers};
pub use job::{JobHandle, JobId, JobIdParseError};
pub use result::{CapturedOutput, ExecutionResult, FailureCause};
pub use snapshot::{JobState, QueueSnapshot};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use verdict::{
    classify, AcceptedExitCodes, ExitCodeVerdict, Verdict, VerdictStrategy,
};
pub use work_item::WorkItemId;
