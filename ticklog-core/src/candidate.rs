//! Scored match candidates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ticket::TicketRecord;

/// Where a candidate's score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    /// Lexical best match used because the oracle was disabled or failed.
    KeywordFallback,
    /// Lexical score computed by the preliminary ranker.
    KeywordBatch,
    /// Oracle best match from a single-task call.
    GeminiAi,
    /// Oracle best match from the batched call.
    GeminiAiMega,
    /// Any runner-up candidate.
    Alternative,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMethod::KeywordFallback => "keyword-fallback",
            MatchMethod::KeywordBatch => "keyword-batch",
            MatchMethod::GeminiAi => "gemini-ai",
            MatchMethod::GeminiAiMega => "gemini-ai-mega",
            MatchMethod::Alternative => "alternative",
        }
    }

    pub fn is_oracle(self) -> bool {
        matches!(self, MatchMethod::GeminiAi | MatchMethod::GeminiAiMega)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub ticket: Arc<TicketRecord>,
    /// Always within [0, 1].
    pub score: f64,
    pub method: MatchMethod,
}

impl MatchCandidate {
    pub fn new(ticket: Arc<TicketRecord>, score: f64, method: MatchMethod) -> Self {
        Self {
            ticket,
            score: clamp_score(score),
            method,
        }
    }

    pub fn key(&self) -> &str {
        &self.ticket.key
    }

    pub fn with_method(mut self, method: MatchMethod) -> Self {
        self.method = method;
        self
    }
}

/// Clamp into [0, 1]; NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(1.7), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 1.0);
        assert_eq!(clamp_score(0.42), 0.42);
    }

    #[test]
    fn test_candidate_constructor_clamps() {
        let t = Arc::new(TicketRecord::new("EW-1", "x"));
        let c = MatchCandidate::new(t, 3.0, MatchMethod::GeminiAiMega);
        assert_eq!(c.score, 1.0);
        assert_eq!(c.key(), "EW-1");
    }

    #[test]
    fn test_method_serializes_kebab_case() {
        let s = serde_json::to_string(&MatchMethod::GeminiAiMega).unwrap();
        assert_eq!(s, "\"gemini-ai-mega\"");
        let s = serde_json::to_string(&MatchMethod::KeywordFallback).unwrap();
        assert_eq!(s, "\"keyword-fallback\"");
    }
}
