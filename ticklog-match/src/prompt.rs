//! Oracle prompt construction.
//!
//! One prompt covers every task plus the shared ticket list. Each task carries
//! its project tag and its top lexical hints so the oracle stays grounded.

use std::fmt::Write as _;
use std::sync::Arc;

use ticklog_core::{MatchCandidate, TicketRecord, TodoEntry};

pub const SUMMARY_MAX_CHARS: usize = 100;
pub const HINTS_PER_TASK: usize = 2;

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Build the prompt. `preliminary[i]` holds the lexical ranking of `entries[i]`.
pub fn build_prompt(
    entries: &[TodoEntry],
    preliminary: &[Vec<MatchCandidate>],
    tickets: &[Arc<TicketRecord>],
) -> String {
    let mut p = String::new();

    p.push_str(
        "You match work log tasks to issue tracker tickets.\n\
For every task pick the single best ticket and up to 2 alternatives from the TICKETS list.\n\
Only use ticket keys that appear in the list. Use null when nothing fits.\n\
Confidence is a number between 0 and 1.\n\n",
    );

    p.push_str("TASKS:\n");
    for (i, e) in entries.iter().enumerate() {
        let _ = write!(p, "{i}. \"{}\"", e.task);
        if let Some(project) = &e.project_identifier {
            let _ = write!(p, " [project: {project}]");
        }
        p.push('\n');

        let hints = preliminary.get(i).map(Vec::as_slice).unwrap_or_default();
        if !hints.is_empty() {
            let rendered: Vec<String> = hints
                .iter()
                .take(HINTS_PER_TASK)
                .map(|c| format!("{} ({:.2})", c.key(), c.score))
                .collect();
            let _ = writeln!(p, "   keyword hints: {}", rendered.join(", "));
        }
    }

    p.push_str("\nTICKETS:\n");
    for t in tickets {
        let _ = writeln!(
            p,
            "{} | {} | {}",
            t.key,
            t.issue_type,
            truncate_chars(&t.summary, SUMMARY_MAX_CHARS)
        );
    }

    p.push_str(
        "\nReply with ONLY one JSON object, no prose, in this shape:\n\
{\"matches\": [{\"taskIndex\": 0, \
\"bestMatch\": {\"ticketKey\": \"KEY-1\", \"confidence\": 0.85, \"reasoning\": \"short reason\"}, \
\"alternatives\": [{\"ticketKey\": \"KEY-2\", \"confidence\": 0.4, \"reasoning\": \"short reason\"}]}]}\n",
    );
    let _ = writeln!(p, "Include one element per task index from 0 to {}.", entries.len().saturating_sub(1));

    p
}
