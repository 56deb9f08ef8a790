use serde::{Deserialize, Serialize};
use ticklog_core::{TicketRecord, TimeInfo};

/// One page of a ticket search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub issues: Vec<TicketRecord>,
    pub is_last: bool,
    pub next_page_token: Option<String>,
}

/// Leading tag of a rendered timesheet line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineTag {
    Ticket(String),
    Skipped,
    Unmapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetLine {
    pub tag: LineTag,
    pub task: String,
    pub time_info: TimeInfo,
}

impl TimesheetLine {
    pub fn ticket_key(&self) -> Option<&str> {
        match &self.tag {
            LineTag::Ticket(k) => Some(k),
            _ => None,
        }
    }
}

/// Time to log against one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogDraft {
    pub issue_key: String,
    pub comment: String,
    /// ISO 8601 with milliseconds and numeric offset, e.g. 2024-01-02T10:00:00.000+0000
    pub started: String,
    pub duration_seconds: i64,
}
