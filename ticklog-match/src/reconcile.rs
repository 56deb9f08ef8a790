//! Match reconciliation: turn oracle keys or lexical rankings into
//! `ResolvedMatch` values over the shared ticket universe.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use ticklog_core::{
    CandidateFilter, MatchCandidate, MatchMethod, ResolvedMatch, TicketRecord, TodoEntry, MAX_ALTERNATIVES,
};

use crate::reply::{OracleSuggestion, OracleTaskMatch};

/// Key lookup over the universe. The first record wins on a duplicate key.
pub struct TicketIndex<'a> {
    by_key: HashMap<&'a str, &'a Arc<TicketRecord>>,
}

impl<'a> TicketIndex<'a> {
    pub fn new(universe: &'a [Arc<TicketRecord>]) -> Self {
        let mut by_key = HashMap::with_capacity(universe.len());
        for t in universe {
            by_key.entry(t.key.as_str()).or_insert(t);
        }
        Self { by_key }
    }

    pub fn get(&self, key: &str) -> Option<Arc<TicketRecord>> {
        self.by_key.get(key).map(|t| Arc::clone(t))
    }
}

/// Per-task view: only tickets the filter accepts for this task resolve.
struct TaskScope<'i, 'a> {
    index: &'i TicketIndex<'a>,
    filter: &'i CandidateFilter,
    project: Option<&'i str>,
}

impl TaskScope<'_, '_> {
    fn resolve(&self, s: &OracleSuggestion, method: MatchMethod) -> Option<MatchCandidate> {
        let Some(ticket) = self.index.get(&s.ticket_key) else {
            debug!(key = %s.ticket_key, "oracle referenced an unknown ticket");
            return None;
        };
        if !self.filter.is_eligible(&ticket, self.project) {
            debug!(key = %s.ticket_key, project = ?self.project, "oracle picked a ticket ineligible for the task");
            return None;
        }
        Some(MatchCandidate::new(ticket, s.confidence, method))
    }
}

/// Oracle branch, one slot per entry. Unknown keys and tickets the filter
/// rejects for that entry become "no match"; alternatives repeating the
/// best key are dropped.
pub fn reconcile_oracle(
    matches: Vec<OracleTaskMatch>,
    entries: &[TodoEntry],
    universe: &[Arc<TicketRecord>],
    filter: &CandidateFilter,
    best_method: MatchMethod,
) -> Vec<ResolvedMatch> {
    let index = TicketIndex::new(universe);

    matches
        .into_iter()
        .zip(entries)
        .map(|(m, entry)| {
            let scope = TaskScope {
                index: &index,
                filter,
                project: entry.project_identifier.as_deref(),
            };
            let best = m.best.as_ref().and_then(|b| scope.resolve(b, best_method));

            let mut alternatives: Vec<MatchCandidate> = Vec::new();
            for alt in &m.alternatives {
                let dup_of_best = best.as_ref().is_some_and(|b| b.key() == alt.ticket_key);
                let dup_of_alt = alternatives.iter().any(|a| a.key() == alt.ticket_key);
                if dup_of_best || dup_of_alt {
                    continue;
                }
                if let Some(c) = scope.resolve(alt, MatchMethod::Alternative) {
                    alternatives.push(c);
                }
            }
            alternatives.truncate(MAX_ALTERNATIVES);

            ResolvedMatch { best, alternatives }
        })
        .collect()
}

/// Fallback branch: the lexical leader becomes the best match, the next two
/// become alternatives.
pub fn reconcile_fallback(preliminary: Vec<Vec<MatchCandidate>>) -> Vec<ResolvedMatch> {
    preliminary
        .into_iter()
        .map(|ranked| {
            let mut it = ranked.into_iter();
            let best = it.next().map(|c| c.with_method(MatchMethod::KeywordFallback));
            let alternatives = it
                .take(MAX_ALTERNATIVES)
                .map(|c| c.with_method(MatchMethod::Alternative))
                .collect();
            ResolvedMatch { best, alternatives }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<Arc<TicketRecord>> {
        ["EW-1", "EW-2", "EW-3"]
            .iter()
            .map(|k| Arc::new(TicketRecord::new(*k, "s")))
            .collect()
    }

    fn task(project: Option<&str>) -> TodoEntry {
        TodoEntry::from_task("Fix login", project.map(str::to_string))
    }

    fn sug(key: &str, c: f64) -> OracleSuggestion {
        OracleSuggestion {
            ticket_key: key.to_string(),
            confidence: c,
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_oracle_keys_resolve_to_shared_records() {
        let u = universe();
        let m = OracleTaskMatch {
            best: Some(sug("EW-2", 0.8)),
            alternatives: vec![sug("EW-2", 0.7), sug("GHOST-1", 0.6), sug("EW-1", 0.5), sug("EW-3", 0.4)],
        };
        let out = reconcile_oracle(vec![m], &[task(None)], &u, &CandidateFilter::default(), MatchMethod::GeminiAiMega);
        let r = &out[0];
        let best = r.best.as_ref().unwrap();
        assert_eq!(best.key(), "EW-2");
        assert_eq!(best.method, MatchMethod::GeminiAiMega);
        assert!(Arc::ptr_eq(&best.ticket, &u[1]));

        let alts: Vec<_> = r.alternatives.iter().map(|a| a.key()).collect();
        assert_eq!(alts, vec!["EW-1", "EW-3"]);
        assert!(r.alternatives.iter().all(|a| a.method == MatchMethod::Alternative));
    }

    #[test]
    fn test_hallucinated_best_is_no_match() {
        let out = reconcile_oracle(
            vec![OracleTaskMatch {
                best: Some(sug("NOPE-9", 0.99)),
                alternatives: vec![],
            }],
            &[task(None)],
            &universe(),
            &CandidateFilter::default(),
            MatchMethod::GeminiAi,
        );
        assert!(out[0].best.is_none());
        assert_eq!(out[0].best_score(), None);
    }

    #[test]
    fn test_keys_outside_task_scope_are_no_match() {
        let u = vec![
            Arc::new(TicketRecord::new("EW-1", "[MyDebit] Fix login")),
            Arc::new(TicketRecord::new("PAY-1", "[Payments] Refund flow")),
            Arc::new(TicketRecord::new("EW-9", "[MyDebit] Old login").with_status("Done")),
        ];
        let m = OracleTaskMatch {
            best: Some(sug("PAY-1", 0.95)),
            alternatives: vec![sug("EW-9", 0.5), sug("EW-1", 0.4)],
        };
        let out = reconcile_oracle(
            vec![m],
            &[task(Some("mydebit"))],
            &u,
            &CandidateFilter::default(),
            MatchMethod::GeminiAiMega,
        );
        assert!(out[0].best.is_none());
        let alts: Vec<_> = out[0].alternatives.iter().map(|a| a.key()).collect();
        assert_eq!(alts, vec!["EW-1"]);
    }

    #[test]
    fn test_fallback_labels() {
        let u = universe();
        let ranked: Vec<_> = u
            .iter()
            .map(|t| MatchCandidate::new(t.clone(), 0.5, MatchMethod::KeywordBatch))
            .collect();
        let out = reconcile_fallback(vec![ranked, vec![]]);
        assert_eq!(out[0].best.as_ref().unwrap().method, MatchMethod::KeywordFallback);
        assert_eq!(out[0].alternatives.len(), 2);
        assert!(out[0].alternatives.iter().all(|a| a.method == MatchMethod::Alternative));
        assert_eq!(out[1], ResolvedMatch::none());
    }
}
