//! ticklog-ingest: boundary parsing of tracker payloads and rendered timesheets.

pub mod parsers;
pub mod types;
pub mod worklog;

pub use parsers::jira::{parse_issue, parse_search_page, search_fields};
pub use parsers::timesheet::{parse_timesheet, parse_timesheet_line};
pub use types::{LineTag, SearchPage, TimesheetLine, WorklogDraft};
pub use worklog::{drafts_from_lines, parse_lasted, parse_started};
