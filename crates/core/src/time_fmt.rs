// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact elapsed-time formatting for status lines and reports.

/// Format seconds as `42s`, `3m07s`, `2h05m` or `1d03h`.
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else if secs < 86_400 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d{:02}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

/// Like [`format_elapsed`], but sub-second values print as `NNNms`.
pub fn format_elapsed_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format_elapsed(ms / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        zero      = { 0,       "0s" },
        seconds   = { 42,      "42s" },
        minute    = { 60,      "1m00s" },
        minutes   = { 187,     "3m07s" },
        hour      = { 3600,    "1h00m" },
        hours     = { 7500,    "2h05m" },
        day       = { 97_200,  "1d03h" },
    )]
    fn elapsed(secs: u64, expected: &str) {
        assert_eq!(format_elapsed(secs), expected);
    }

    #[test]
    fn elapsed_ms() {
        assert_eq!(format_elapsed_ms(250), "250ms");
        assert_eq!(format_elapsed_ms(61_500), "1m01s");
    }
}
