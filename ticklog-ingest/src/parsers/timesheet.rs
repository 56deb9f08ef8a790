//! Rendered timesheet lines, the inverse of `ticklog_core::render`.
//!
//!   [EW-1] Fix login timeout
//!   [UNMAPPED] Deploy service @started(24-01-02 10:00) @done(24-01-02 11:00) @lasted(1h0m0s)
//!   [SKIPPED] Lunch

use std::sync::LazyLock;

use regex::Regex;
use ticklog_core::render::{SKIPPED_TAG, UNMAPPED_TAG};
use ticklog_core::split_time_annotations;

use crate::types::{LineTag, TimesheetLine};

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(?P<tag>[^\]\s]+)\]\s+(?P<rest>.+?)\s*$").expect("timesheet line regex")
});

pub fn parse_timesheet_line(line: &str) -> Option<TimesheetLine> {
    let caps = LINE_RE.captures(line)?;

    let tag = match &caps["tag"] {
        t if t.eq_ignore_ascii_case(SKIPPED_TAG) => LineTag::Skipped,
        t if t.eq_ignore_ascii_case(UNMAPPED_TAG) => LineTag::Unmapped,
        key => LineTag::Ticket(key.to_string()),
    };

    let (task, time_info) = split_time_annotations(&caps["rest"]);
    if task.is_empty() {
        return None;
    }

    Some(TimesheetLine { tag, task, time_info })
}

pub fn parse_timesheet(text: &str) -> Vec<TimesheetLine> {
    text.lines().filter_map(parse_timesheet_line).collect()
}
