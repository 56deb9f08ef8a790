//! Processed entries: the terminal unit handed back to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::MatchCandidate;
use crate::classify::{EntryStatus, Thresholds};
use crate::ticket::TicketRecord;
use crate::todo::{TimeInfo, TodoEntry};

/// At most one best match plus this many alternatives.
pub const MAX_ALTERNATIVES: usize = 2;

/// A task's resolved best match and runners-up, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMatch {
    pub best: Option<MatchCandidate>,
    pub alternatives: Vec<MatchCandidate>,
}

impl ResolvedMatch {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEntry {
    pub id: String,
    pub task: String,
    pub project_identifier: Option<String>,
    pub time_info: Option<TimeInfo>,
    /// Best match first, then alternatives. At most 3.
    pub matches: Vec<MatchCandidate>,
    pub selected_ticket: Option<Arc<TicketRecord>>,
    pub status: EntryStatus,
    pub confidence: Option<f64>,
}

impl ProcessedEntry {
    /// Classify a resolved match for one todo entry.
    pub fn classify(entry: &TodoEntry, resolved: ResolvedMatch, thresholds: &Thresholds) -> Self {
        let confidence = resolved.best_score();
        let status = thresholds.classify(confidence);

        let selected_ticket = match status {
            EntryStatus::AutoAssigned => resolved.best.as_ref().map(|b| Arc::clone(&b.ticket)),
            _ => None,
        };

        let mut matches: Vec<MatchCandidate> = resolved.best.into_iter().collect();
        matches.extend(resolved.alternatives.into_iter().take(MAX_ALTERNATIVES));

        Self {
            id: Uuid::new_v4().to_string(),
            task: entry.task.clone(),
            project_identifier: entry.project_identifier.clone(),
            time_info: entry.time_info.clone(),
            matches,
            selected_ticket,
            status,
            confidence,
        }
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_ticket.as_deref().map(|t| t.key.as_str())
    }

    /// Manual skip. Drops any selection.
    pub fn skipped(mut self) -> Self {
        self.status = EntryStatus::Skipped;
        self.selected_ticket = None;
        self
    }

    /// Manual choice among the entry's own candidates. The status is kept;
    /// `None` when the key is not one of the candidates.
    pub fn select(mut self, key: &str) -> Option<Self> {
        let ticket = self.matches.iter().find(|c| c.key() == key)?.ticket.clone();
        self.selected_ticket = Some(ticket);
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::MatchMethod;

    fn cand(key: &str, score: f64, method: MatchMethod) -> MatchCandidate {
        MatchCandidate::new(Arc::new(TicketRecord::new(key, "s")), score, method)
    }

    #[test]
    fn test_auto_assign_selects_best() {
        let entry = TodoEntry::from_task("deploy", None);
        let resolved = ResolvedMatch {
            best: Some(cand("EW-1", 0.9, MatchMethod::GeminiAiMega)),
            alternatives: vec![cand("EW-2", 0.4, MatchMethod::Alternative)],
        };
        let p = ProcessedEntry::classify(&entry, resolved, &Thresholds::default());
        assert_eq!(p.status, EntryStatus::AutoAssigned);
        assert_eq!(p.selected_key(), Some("EW-1"));
        assert_eq!(p.matches.len(), 2);
        assert_eq!(p.confidence, Some(0.9));
    }

    #[test]
    fn test_needs_selection_leaves_unselected() {
        let entry = TodoEntry::from_task("deploy", None);
        let resolved = ResolvedMatch {
            best: Some(cand("EW-1", 0.6, MatchMethod::KeywordFallback)),
            alternatives: vec![],
        };
        let p = ProcessedEntry::classify(&entry, resolved, &Thresholds::default());
        assert_eq!(p.status, EntryStatus::NeedsSelection);
        assert!(p.selected_ticket.is_none());
    }

    #[test]
    fn test_no_best_is_unmapped_without_confidence() {
        let entry = TodoEntry::from_task("deploy", None);
        let p = ProcessedEntry::classify(&entry, ResolvedMatch::none(), &Thresholds::default());
        assert_eq!(p.status, EntryStatus::Unmapped);
        assert_eq!(p.confidence, None);
        assert!(p.matches.is_empty());
    }

    #[test]
    fn test_alternatives_capped() {
        let entry = TodoEntry::from_task("deploy", None);
        let resolved = ResolvedMatch {
            best: Some(cand("A", 0.2, MatchMethod::GeminiAiMega)),
            alternatives: vec![
                cand("B", 0.1, MatchMethod::Alternative),
                cand("C", 0.1, MatchMethod::Alternative),
                cand("D", 0.1, MatchMethod::Alternative),
            ],
        };
        let p = ProcessedEntry::classify(&entry, resolved, &Thresholds::default());
        assert_eq!(p.matches.len(), 3);
    }

    #[test]
    fn test_manual_select_and_skip() {
        let entry = TodoEntry::from_task("deploy", None);
        let resolved = ResolvedMatch {
            best: Some(cand("EW-1", 0.6, MatchMethod::KeywordFallback)),
            alternatives: vec![cand("EW-2", 0.5, MatchMethod::Alternative)],
        };
        let p = ProcessedEntry::classify(&entry, resolved, &Thresholds::default());
        assert!(p.clone().select("NOPE-1").is_none());

        let chosen = p.clone().select("EW-2").unwrap();
        assert_eq!(chosen.selected_key(), Some("EW-2"));
        assert_eq!(chosen.status, EntryStatus::NeedsSelection);

        let skipped = chosen.skipped();
        assert_eq!(skipped.status, EntryStatus::Skipped);
        assert!(skipped.selected_ticket.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let entry = TodoEntry::from_task("deploy", None);
        let a = ProcessedEntry::classify(&entry, ResolvedMatch::none(), &Thresholds::default());
        let b = ProcessedEntry::classify(&entry, ResolvedMatch::none(), &Thresholds::default());
        assert_ne!(a.id, b.id);
    }
}
