//! The matching pipeline: rank, consult the oracle, reconcile, classify.
//!
//! Nothing on the oracle path can fail a request. Any oracle problem turns
//! into `MatchOutcome::Fallback` and the lexical ranking is used instead.

use std::sync::Arc;

use tracing::{info, warn};

use ticklog_core::{
    CandidateFilter, MatchCandidate, MatchMethod, PreliminaryRanker, ProcessedEntry, ResolvedMatch, Thresholds,
    TicketRecord, TodoEntry,
};

use crate::cascade::{MatchingOracleClient, OracleFailure};
use crate::reconcile::{reconcile_fallback, reconcile_oracle};
use crate::reply::OracleTaskMatch;

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    Disabled,
    NoOracleClient,
    NoEligibleTickets,
    OracleFailed(OracleFailure),
}

/// Which branch produced a run's matches.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Oracle(Vec<OracleTaskMatch>),
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    ranker: PreliminaryRanker,
    oracle: Option<MatchingOracleClient>,
}

/// Tickets passing the exclusions and eligible for at least one task.
/// This is the prompt's shared list; each task's picks are re-checked
/// against its own project during reconciliation.
pub fn oracle_universe(
    filter: &CandidateFilter,
    entries: &[TodoEntry],
    universe: &[Arc<TicketRecord>],
) -> Vec<Arc<TicketRecord>> {
    universe
        .iter()
        .filter(|t| {
            entries
                .iter()
                .any(|e| filter.is_eligible(t, e.project_identifier.as_deref()))
        })
        .cloned()
        .collect()
}

impl Matcher {
    pub fn new(ranker: PreliminaryRanker) -> Self {
        Self { ranker, oracle: None }
    }

    pub fn with_oracle(mut self, client: MatchingOracleClient) -> Self {
        self.oracle = Some(client);
        self
    }

    pub fn ranker(&self) -> &PreliminaryRanker {
        &self.ranker
    }

    /// Ask the oracle about every task at once, or say why not.
    pub async fn consult_oracle(
        &self,
        entries: &[TodoEntry],
        preliminary: &[Vec<MatchCandidate>],
        tickets: &[Arc<TicketRecord>],
        use_oracle: bool,
    ) -> MatchOutcome {
        if !use_oracle {
            return MatchOutcome::Fallback(FallbackReason::Disabled);
        }
        let Some(client) = &self.oracle else {
            return MatchOutcome::Fallback(FallbackReason::NoOracleClient);
        };
        if tickets.is_empty() {
            return MatchOutcome::Fallback(FallbackReason::NoEligibleTickets);
        }

        match client.match_batch(entries, preliminary, tickets).await {
            Ok(matches) => MatchOutcome::Oracle(matches),
            Err(e) => MatchOutcome::Fallback(FallbackReason::OracleFailed(e)),
        }
    }

    /// Match every entry against the universe. One result per entry, in order.
    pub async fn match_all(
        &self,
        entries: &[TodoEntry],
        universe: &[Arc<TicketRecord>],
        thresholds: &Thresholds,
        use_oracle: bool,
    ) -> Vec<ProcessedEntry> {
        if entries.is_empty() {
            return Vec::new();
        }
        if !thresholds.is_ordered() {
            warn!(?thresholds, "thresholds are not ordered; statuses may not be monotonic");
        }

        let preliminary = self.ranker.rank_all(entries, universe);
        let tickets = oracle_universe(self.ranker.filter(), entries, universe);

        let resolved = match self.consult_oracle(entries, &preliminary, &tickets, use_oracle).await {
            MatchOutcome::Oracle(matches) => {
                info!(tasks = entries.len(), tickets = tickets.len(), "using oracle matches");
                reconcile_oracle(matches, entries, &tickets, self.ranker.filter(), MatchMethod::GeminiAiMega)
            }
            MatchOutcome::Fallback(reason) => {
                log_fallback(&reason, entries.len());
                reconcile_fallback(preliminary)
            }
        };

        entries
            .iter()
            .zip(resolved)
            .map(|(e, r)| ProcessedEntry::classify(e, r, thresholds))
            .collect()
    }

    /// Single-entry variant with the shorter single-task timeout.
    pub async fn match_one(
        &self,
        entry: &TodoEntry,
        universe: &[Arc<TicketRecord>],
        thresholds: &Thresholds,
        use_oracle: bool,
    ) -> ProcessedEntry {
        let preliminary = self.ranker.rank(entry, universe);
        let tickets = oracle_universe(self.ranker.filter(), std::slice::from_ref(entry), universe);

        let oracle_result = match (&self.oracle, use_oracle, tickets.is_empty()) {
            (Some(client), true, false) => Some(client.match_single(entry, &preliminary, &tickets).await),
            _ => None,
        };

        let resolved = match oracle_result {
            Some(Ok(m)) => reconcile_oracle(
                vec![m],
                std::slice::from_ref(entry),
                &tickets,
                self.ranker.filter(),
                MatchMethod::GeminiAi,
            )
            .pop()
            .unwrap_or_else(ResolvedMatch::none),
            Some(Err(e)) => {
                log_fallback(&FallbackReason::OracleFailed(e), 1);
                fallback_one(preliminary)
            }
            None => fallback_one(preliminary),
        };

        ProcessedEntry::classify(entry, resolved, thresholds)
    }
}

fn fallback_one(preliminary: Vec<MatchCandidate>) -> ResolvedMatch {
    reconcile_fallback(vec![preliminary]).pop().unwrap_or_else(ResolvedMatch::none)
}

fn log_fallback(reason: &FallbackReason, tasks: usize) {
    match reason {
        FallbackReason::OracleFailed(e) => {
            warn!(tasks, error = %e, "oracle unavailable, using keyword matches");
        }
        other => info!(tasks, reason = ?other, "using keyword matches"),
    }
}
