// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Failed items: soft red
    pub const FAILED: u8 = 167;
    /// Unconfirmed items and warnings: amber
    pub const UNCONFIRMED: u8 = 179;
    /// Passing stage summary: sage green
    pub const PASSED: u8 = 108;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

pub fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

/// Color one line of a rendered stage report by its leading label.
pub fn report_line(line: &str, overall_success: bool) -> String {
    if line.starts_with("FAILED ") {
        paint(codes::FAILED, line)
    } else if line.starts_with("UNCONFIRMED ") {
        paint(codes::UNCONFIRMED, line)
    } else if line.starts_with("  warning: ") {
        paint(codes::UNCONFIRMED, line)
    } else if line.starts_with("  ") {
        paint(codes::CONTEXT, line)
    } else if overall_success {
        paint(codes::PASSED, line)
    } else {
        paint(codes::HEADER, line)
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
