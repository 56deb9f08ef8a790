//! Turn mapped timesheet lines into worklog drafts.

use std::sync::LazyLock;

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;

use crate::types::{TimesheetLine, WorklogDraft};

static LASTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<d>\d+)d)?(?:(?P<h>\d+)h)?(?:(?P<m>\d+)m)?(?:(?P<s>\d+)s)?$")
        .expect("lasted regex")
});

/// "1h0m0s" -> 3600. Any subset of d/h/m/s in that order.
/// `None` when the total does not fit in an `i64`.
pub fn parse_lasted(s: &str) -> Option<i64> {
    let s = s.trim().to_lowercase().replace(' ', "");
    if s.is_empty() {
        return None;
    }
    let caps = LASTED_RE.captures(&s)?;
    let part = |name: &str, unit: i64| -> Option<i64> {
        match caps.name(name) {
            Some(m) => m.as_str().parse::<i64>().ok()?.checked_mul(unit),
            None => Some(0),
        }
    };
    [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)]
        .into_iter()
        .try_fold(0i64, |total, (name, unit)| total.checked_add(part(name, unit)?))
}

/// "24-01-02 10:00" or "2024-01-02 10:00", seconds optional.
pub fn parse_started(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let year_len = s.split('-').next().map(str::len).unwrap_or(0);
    let formats: &[&str] = if year_len == 4 {
        &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
    } else {
        &["%y-%m-%d %H:%M:%S", "%y-%m-%d %H:%M"]
    };
    formats
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

impl WorklogDraft {
    /// Only ticket lines with a parsable start and a positive duration qualify.
    /// Duration comes from `@lasted`, else `@done` minus `@started`.
    pub fn from_line(line: &TimesheetLine, offset: FixedOffset) -> Option<Self> {
        let issue_key = line.ticket_key()?.to_string();
        let started = parse_started(line.time_info.started.as_deref()?)?;

        let duration_seconds = match line.time_info.lasted.as_deref().and_then(parse_lasted) {
            Some(secs) => secs,
            None => {
                let done = parse_started(line.time_info.done.as_deref()?)?;
                (done - started).num_seconds()
            }
        };
        if duration_seconds <= 0 {
            return None;
        }

        let started = offset.from_local_datetime(&started).single()?;

        Some(Self {
            issue_key,
            comment: line.task.clone(),
            started: started.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
            duration_seconds,
        })
    }
}

pub fn drafts_from_lines(lines: &[TimesheetLine], offset: FixedOffset) -> Vec<WorklogDraft> {
    lines.iter().filter_map(|l| WorklogDraft::from_line(l, offset)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::timesheet::parse_timesheet_line;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_parse_lasted() {
        assert_eq!(parse_lasted("1h0m0s"), Some(3600));
        assert_eq!(parse_lasted("45m"), Some(2700));
        assert_eq!(parse_lasted("1d2h"), Some(93_600));
        assert_eq!(parse_lasted("90s"), Some(90));
        assert_eq!(parse_lasted(""), None);
        assert_eq!(parse_lasted("soon"), None);
    }

    #[test]
    fn test_parse_lasted_overflow_is_none() {
        assert_eq!(parse_lasted("999999999999999d"), None);
        // Each part fits; the sum does not.
        assert_eq!(parse_lasted("106751991167300d24h"), None);
        assert_eq!(parse_lasted("99999999999999999999s"), None);
    }

    #[test]
    fn test_parse_started_formats() {
        let a = parse_started("24-01-02 10:00").unwrap();
        let b = parse_started("2024-01-02 10:00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_started("yesterday").is_none());
    }

    #[test]
    fn test_draft_from_mapped_line() {
        let line = parse_timesheet_line(
            "[EW-1] Deploy service @started(24-01-02 10:00) @done(24-01-02 11:00) @lasted(1h0m0s)",
        )
        .unwrap();
        let d = WorklogDraft::from_line(&line, utc()).unwrap();
        assert_eq!(d.issue_key, "EW-1");
        assert_eq!(d.comment, "Deploy service");
        assert_eq!(d.started, "2024-01-02T10:00:00.000+0000");
        assert_eq!(d.duration_seconds, 3600);
    }

    #[test]
    fn test_draft_duration_from_done() {
        let line = parse_timesheet_line("[EW-1] Pairing @started(24-01-02 10:00) @done(24-01-02 10:30)").unwrap();
        let d = WorklogDraft::from_line(&line, FixedOffset::east_opt(3600).unwrap()).unwrap();
        assert_eq!(d.duration_seconds, 1800);
        assert_eq!(d.started, "2024-01-02T10:00:00.000+0100");
    }

    #[test]
    fn test_unmapped_and_untimed_lines_skipped() {
        let lines: Vec<_> = [
            "[UNMAPPED] Deploy @started(24-01-02 10:00) @lasted(1h)",
            "[SKIPPED] Lunch @started(24-01-02 12:00) @lasted(1h)",
            "[EW-1] No timing",
            "[EW-2] Zero @started(24-01-02 10:00) @lasted(0m)",
        ]
        .iter()
        .filter_map(|l| parse_timesheet_line(l))
        .collect();
        assert!(drafts_from_lines(&lines, utc()).is_empty());
    }
}
