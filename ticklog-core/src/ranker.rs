//! Preliminary ranker: lexical scoring over every eligible ticket, per task.
//!
//! Its output seeds the oracle prompt and is the complete fallback result.

use std::sync::Arc;

use crate::candidate::{MatchCandidate, MatchMethod};
use crate::filter::CandidateFilter;
use crate::scoring::lexical_score;
use crate::ticket::TicketRecord;
use crate::todo::TodoEntry;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone)]
pub struct PreliminaryRanker {
    filter: CandidateFilter,
    top_n: usize,
}

impl Default for PreliminaryRanker {
    fn default() -> Self {
        Self::new(CandidateFilter::default(), DEFAULT_TOP_N)
    }
}

impl PreliminaryRanker {
    pub fn new(filter: CandidateFilter, top_n: usize) -> Self {
        Self { filter, top_n }
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Top-N candidates for one task, best first. Zero scores are dropped.
    /// The sort is stable, so equal scores keep universe order.
    pub fn rank(&self, entry: &TodoEntry, universe: &[Arc<TicketRecord>]) -> Vec<MatchCandidate> {
        let project = entry.project_identifier.as_deref();

        let mut scored: Vec<MatchCandidate> = universe
            .iter()
            .filter(|t| self.filter.is_eligible(t, project))
            .filter_map(|t| {
                let score = lexical_score(&entry.task, t);
                (score > 0.0).then(|| MatchCandidate::new(Arc::clone(t), score, MatchMethod::KeywordBatch))
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_n);
        scored
    }

    /// One ranking per task, in task order.
    pub fn rank_all(&self, entries: &[TodoEntry], universe: &[Arc<TicketRecord>]) -> Vec<Vec<MatchCandidate>> {
        entries.iter().map(|e| self.rank(e, universe)).collect()
    }
}
