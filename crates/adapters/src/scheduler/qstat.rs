// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for the default `qstat` listing.
//!
//! ```text
//! job-ID  prior   name       user   state submit/start at     queue          slots ja-task-ID
//! -------------------------------------------------------------------------------------------
//!  812345 0.55500 sh_s01     alice  r     03/14/2024 10:01:07 all.q@node07   8
//!  812346 0.00000 sh_s02     alice  qw    03/14/2024 10:01:08                8
//! ```

use stagehand_core::{JobId, JobState, QueueSnapshot};

/// Column index of the state field.
const STATE_COLUMN: usize = 4;

/// Parse `qstat` stdout into a snapshot.
///
/// Rows whose first column is not an integer job id (headers, rules, blank
/// lines, continuation lines) are skipped.
pub fn parse_qstat(stdout: &str) -> QueueSnapshot {
    let mut snapshot = QueueSnapshot::new();
    for line in stdout.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        let Some(id) = columns.first().and_then(|c| c.parse::<u64>().ok()) else {
            continue;
        };
        let Some(state) = columns.get(STATE_COLUMN) else {
            continue;
        };
        snapshot.insert(JobId(id), state_from_code(state));
    }
    snapshot
}

/// Queued states (`qw`, `hqw`, `Eqw`, ...) wait; everything else is on a host.
fn state_from_code(code: &str) -> JobState {
    if code.contains('q') {
        JobState::Waiting
    } else {
        JobState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
job-ID  prior   name       user         state submit/start at     queue                          slots ja-task-ID
-----------------------------------------------------------------------------------------------------------------
 812345 0.55500 sh_s01     alice        r     03/14/2024 10:01:07 all.q@node07.cluster              8
 812346 0.00000 sh_s02     alice        qw    03/14/2024 10:01:08                                   8
 812347 0.00000 sh_s03     alice        Eqw   03/14/2024 10:01:09                                   8
 812348 0.55500 sh_s04     alice        t     03/14/2024 10:01:10 all.q@node02.cluster              8
";

    #[test]
    fn parses_running_and_waiting_rows() {
        let snap = parse_qstat(LISTING);
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.state(JobId(812345)), JobState::Running);
        assert_eq!(snap.state(JobId(812346)), JobState::Waiting);
        assert_eq!(snap.state(JobId(812347)), JobState::Waiting);
        assert_eq!(snap.state(JobId(812348)), JobState::Running);
    }

    #[test]
    fn empty_listing_is_empty_snapshot() {
        assert!(parse_qstat("").is_empty());
        assert!(parse_qstat("\n\n").is_empty());
    }

    #[test]
    fn array_tasks_collapse_to_one_id() {
        let listing = "\
 900 0.5 arr alice r  03/14/2024 10:01:07 all.q@node1 1 1
 900 0.5 arr alice r  03/14/2024 10:01:07 all.q@node2 1 2
 900 0.0 arr alice qw 03/14/2024 10:01:07             1 3-10:1
";
        let snap = parse_qstat(listing);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.state(JobId(900)), JobState::Running);
    }

    #[test]
    fn truncated_rows_are_skipped() {
        let snap = parse_qstat(" 77 0.5 name\n");
        assert!(snap.is_empty());
    }

    #[yare::parameterized(
        running    = { "r",   JobState::Running },
        transfer   = { "t",   JobState::Running },
        restarted  = { "Rr",  JobState::Running },
        suspended  = { "s",   JobState::Running },
        deleting   = { "dr",  JobState::Running },
        queued     = { "qw",  JobState::Waiting },
        held       = { "hqw", JobState::Waiting },
        error      = { "Eqw", JobState::Waiting },
    )]
    fn state_codes(code: &str, expected: JobState) {
        assert_eq!(state_from_code(code), expected);
    }
}
