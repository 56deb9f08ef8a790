//! Deterministic lexical scoring between a task and a ticket.
//!
//! Substring based on purpose; no stemming, no synonyms.
//!
//! score = (significant task tokens found in "summary description") / (all task tokens)

use crate::ticket::TicketRecord;

/// Tokens of this length or shorter never count as a hit.
pub const MIN_SIGNIFICANT_LEN: usize = 2;

fn tokenize(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_lowercase).collect()
}

/// Score a task against a ticket in [0, 1].
pub fn lexical_score(task: &str, ticket: &TicketRecord) -> f64 {
    let tokens = tokenize(task);
    if tokens.is_empty() {
        return 0.0;
    }
    let haystack = ticket.searchable_text().to_lowercase();

    let hits = tokens
        .iter()
        .filter(|t| t.chars().count() > MIN_SIGNIFICANT_LEN)
        .filter(|t| haystack.contains(t.as_str()))
        .count();

    hits as f64 / tokens.len() as f64
}
