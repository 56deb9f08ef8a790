//! Candidate eligibility: status/issue-type exclusions and project-tag overlap.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::ticket::TicketRecord;

static BRACKET_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket tag regex"));

pub const DEFAULT_EXCLUDED_ISSUE_TYPES: &[&str] = &["story", "epic", "feature story"];

pub const DEFAULT_EXCLUDED_STATUSES: &[&str] = &[
    "done",
    "deployed",
    "closed",
    "cancelled",
    "rollback",
    "ready to deploy",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    excluded_issue_types: HashSet<String>,
    excluded_statuses: HashSet<String>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_ISSUE_TYPES.iter().copied(),
            DEFAULT_EXCLUDED_STATUSES.iter().copied(),
        )
    }
}

impl CandidateFilter {
    pub fn new<T, S>(
        excluded_issue_types: impl IntoIterator<Item = T>,
        excluded_statuses: impl IntoIterator<Item = S>,
    ) -> Self
    where
        T: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            excluded_issue_types: excluded_issue_types
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
            excluded_statuses: excluded_statuses
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Status / issue-type check only.
    pub fn passes_exclusions(&self, ticket: &TicketRecord) -> bool {
        let issue_type = ticket.issue_type.trim().to_lowercase();
        let status = ticket.status.trim().to_lowercase();
        !self.excluded_issue_types.contains(&issue_type) && !self.excluded_statuses.contains(&status)
    }

    /// Full eligibility for one task.
    pub fn is_eligible(&self, ticket: &TicketRecord, project_identifier: Option<&str>) -> bool {
        if !self.passes_exclusions(ticket) {
            return false;
        }
        match project_identifier {
            Some(project) => matches_project(ticket, project),
            None => true,
        }
    }
}

/// Lowercase and drop all whitespace.
fn normalize_tag(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when any `[tag]` in the ticket text overlaps the project identifier
/// (substring either direction, whitespace and case ignored).
pub fn matches_project(ticket: &TicketRecord, project_identifier: &str) -> bool {
    let project = normalize_tag(project_identifier);
    if project.is_empty() {
        return true;
    }
    let text = ticket.searchable_text();
    BRACKET_TAG_RE.captures_iter(&text).any(|caps| {
        let tag = normalize_tag(&caps[1]);
        !tag.is_empty() && (tag.contains(&project) || project.contains(&tag))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_status_and_type_case_insensitive() {
        let f = CandidateFilter::default();
        assert!(!f.passes_exclusions(&TicketRecord::new("A-1", "x").with_status("Done")));
        assert!(!f.passes_exclusions(&TicketRecord::new("A-2", "x").with_status("Ready To Deploy")));
        assert!(!f.passes_exclusions(&TicketRecord::new("A-3", "x").with_issue_type("EPIC")));
        assert!(!f.passes_exclusions(&TicketRecord::new("A-4", "x").with_issue_type("Feature Story")));
        assert!(f.passes_exclusions(&TicketRecord::new("A-5", "x").with_status("In Progress")));
    }

    #[test]
    fn test_project_tag_overlap() {
        let t = TicketRecord::new("EW-1", "[MyDebit] Fix login");
        assert!(matches_project(&t, "mydebit"));
        assert!(matches_project(&t, "My Debit"));
        // Substring either direction
        assert!(matches_project(&t, "debit"));
        assert!(matches_project(&t, "mydebit-app"));
        assert!(!matches_project(&t, "payments"));
    }

    #[test]
    fn test_project_tag_in_description() {
        let t = TicketRecord::new("EW-2", "Fix login").with_description("Part of [My Debit] rollout");
        assert!(matches_project(&t, "mydebit"));
    }

    #[test]
    fn test_no_tag_is_ineligible_with_project() {
        let f = CandidateFilter::default();
        let t = TicketRecord::new("EW-3", "Fix login");
        assert!(!f.is_eligible(&t, Some("mydebit")));
        assert!(f.is_eligible(&t, None));
    }

    #[test]
    fn test_custom_exclusions() {
        let f = CandidateFilter::new(["Bug"], Vec::<String>::new());
        assert!(!f.passes_exclusions(&TicketRecord::new("A-1", "x").with_issue_type("bug")));
        assert!(f.passes_exclusions(&TicketRecord::new("A-1", "x").with_status("Done")));
    }
}
