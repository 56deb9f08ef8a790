//! Timesheet line rendering.

use crate::classify::EntryStatus;
use crate::entry::ProcessedEntry;

pub const SKIPPED_TAG: &str = "SKIPPED";
pub const UNMAPPED_TAG: &str = "UNMAPPED";

/// `[KEY] task`, `[SKIPPED] task` or `[UNMAPPED] task`, followed by any
/// time annotations in started, done, lasted order.
pub fn render_line(entry: &ProcessedEntry) -> String {
    let tag = match (entry.selected_key(), entry.status) {
        (Some(key), _) => key,
        (None, EntryStatus::Skipped) => SKIPPED_TAG,
        (None, _) => UNMAPPED_TAG,
    };

    let mut line = format!("[{tag}] {}", entry.task);
    if let Some(ti) = &entry.time_info {
        for a in ti.annotations() {
            line.push(' ');
            line.push_str(&a);
        }
    }
    line
}

pub fn render(entries: &[ProcessedEntry]) -> Vec<String> {
    entries.iter().map(render_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{MatchCandidate, MatchMethod};
    use crate::classify::Thresholds;
    use crate::entry::ResolvedMatch;
    use crate::ticket::TicketRecord;
    use crate::todo::parse_todo_line;
    use std::sync::Arc;

    #[test]
    fn test_render_unmapped_with_time_info() {
        let line = "✔ Deploy service @started(24-01-02 10:00) @done(24-01-02 11:00) @lasted(1h0m0s)";
        let entry = parse_todo_line(line).unwrap();
        let p = ProcessedEntry::classify(&entry, ResolvedMatch::none(), &Thresholds::default());
        assert_eq!(
            render_line(&p),
            "[UNMAPPED] Deploy service @started(24-01-02 10:00) @done(24-01-02 11:00) @lasted(1h0m0s)"
        );
    }

    #[test]
    fn test_render_selected_and_skipped() {
        let entry = parse_todo_line("- [mydebit] Fix login timeout").unwrap();
        let best = MatchCandidate::new(
            Arc::new(TicketRecord::new("EW-1", "[MyDebit] Fix login")),
            0.95,
            MatchMethod::GeminiAiMega,
        );
        let resolved = ResolvedMatch { best: Some(best), alternatives: vec![] };
        let p = ProcessedEntry::classify(&entry, resolved, &Thresholds::default());
        assert_eq!(render_line(&p), "[EW-1] Fix login timeout");
        assert_eq!(render_line(&p.skipped()), "[SKIPPED] Fix login timeout");
    }

    #[test]
    fn test_annotation_order_is_fixed() {
        let entry = parse_todo_line("✔ Sync @lasted(5m) @done(24-01-02 11:00)").unwrap();
        let p = ProcessedEntry::classify(&entry, ResolvedMatch::none(), &Thresholds::default());
        assert_eq!(render_line(&p), "[UNMAPPED] Sync @done(24-01-02 11:00) @lasted(5m)");
    }
}
