//! Ticket records: the candidate match targets fetched from the tracker.
//!
//! Records are read-only once fetched. A matching run shares them as
//! `Arc<TicketRecord>` across every entry instead of cloning.

use serde::{Deserialize, Serialize};

pub const UNASSIGNED: &str = "Unassigned";
pub const UNKNOWN_REPORTER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    /// Unique within one matching run, e.g. "PROJ-123".
    pub key: String,
    pub summary: String,
    /// May be empty.
    pub description: String,
    pub status: String,
    pub issue_type: String,
    pub assignee: String,
    pub reporter: String,
    /// Parent epic key, if the tracker reports one.
    pub parent_key: Option<String>,
}

impl TicketRecord {
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            description: String::new(),
            status: "Open".to_string(),
            issue_type: "Task".to_string(),
            assignee: UNASSIGNED.to_string(),
            reporter: UNKNOWN_REPORTER.to_string(),
            parent_key: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_issue_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    pub fn with_parent(mut self, parent_key: impl Into<String>) -> Self {
        self.parent_key = Some(parent_key.into());
        self
    }

    /// Text searched by the lexical scorer and the project-tag filter.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.summary, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_uses_sentinel_people() {
        let t = TicketRecord::new("EW-1", "Fix login");
        assert_eq!(t.assignee, "Unassigned");
        assert_eq!(t.reporter, "Unknown");
        assert!(t.parent_key.is_none());
    }

    #[test]
    fn test_searchable_text_joins_summary_and_description() {
        let t = TicketRecord::new("EW-1", "Fix login").with_description("SSO flow");
        assert_eq!(t.searchable_text(), "Fix login SSO flow");
    }

    #[test]
    fn test_builders_fill_people_and_parent() {
        let t = TicketRecord::new("EW-2", "Fix login")
            .with_assignee("Dana Lee")
            .with_parent("EW-100");
        assert_eq!(t.assignee, "Dana Lee");
        assert_eq!(t.reporter, "Unknown");
        assert_eq!(t.parent_key.as_deref(), Some("EW-100"));
        // People and parent never feed the scorer.
        assert_eq!(t.searchable_text(), "Fix login ");
    }
}
