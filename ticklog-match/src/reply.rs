//! Oracle reply extraction and repair.
//!
//! The reply is untrusted text that should hold one JSON object. Keys are kept
//! as strings here; resolution against real tickets happens in `reconcile`.

use serde_json::Value;
use ticklog_core::{clamp_score, MAX_ALTERNATIVES};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplyError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("reply JSON is invalid: {0}")]
    InvalidJson(String),

    #[error("reply has no matches array")]
    MissingMatches,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleSuggestion {
    pub ticket_key: String,
    /// Clamped to [0, 1].
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleTaskMatch {
    pub best: Option<OracleSuggestion>,
    pub alternatives: Vec<OracleSuggestion>,
}

/// First `{` through last `}`.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
/// The result is always clamped.
pub fn coerce_confidence(v: Option<&Value>) -> f64 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_score(n)
}

fn coerce_index(v: Option<&Value>) -> Option<usize> {
    match v? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return usize::try_from(u).ok();
            }
            let f = n.as_f64()?;
            (f >= 0.0 && f.fract() == 0.0).then_some(f as usize)
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn suggestion(v: &Value) -> Option<OracleSuggestion> {
    let key = v.get("ticketKey").and_then(Value::as_str)?.trim();
    if key.is_empty() {
        return None;
    }
    Some(OracleSuggestion {
        ticket_key: key.to_string(),
        confidence: coerce_confidence(v.get("confidence")),
        reasoning: v
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Parse a reply for `expected` tasks. The result always has `expected`
/// slots; indexes outside the range are ignored and unreferenced slots stay
/// empty. When an element has no index its array position is used, and the
/// first element naming an index wins.
pub fn parse_reply(raw: &str, expected: usize) -> Result<Vec<OracleTaskMatch>, ReplyError> {
    let json = extract_json_object(raw).ok_or(ReplyError::NoJsonObject)?;
    let v: Value = serde_json::from_str(json).map_err(|e| ReplyError::InvalidJson(e.to_string()))?;
    let matches = v
        .get("matches")
        .and_then(Value::as_array)
        .ok_or(ReplyError::MissingMatches)?;

    let mut out = vec![OracleTaskMatch::default(); expected];
    let mut seen = vec![false; expected];

    for (pos, m) in matches.iter().enumerate() {
        let idx = match m.get("taskIndex").or_else(|| m.get("index")) {
            Some(raw_idx) => coerce_index(Some(raw_idx)),
            None => Some(pos),
        };
        let Some(idx) = idx.filter(|i| *i < expected) else {
            continue;
        };
        if seen[idx] {
            continue;
        }
        seen[idx] = true;

        let best = m.get("bestMatch").and_then(suggestion);
        let alternatives = m
            .get("alternatives")
            .and_then(Value::as_array)
            .map(|alts| alts.iter().filter_map(suggestion).take(MAX_ALTERNATIVES).collect())
            .unwrap_or_default();

        out[idx] = OracleTaskMatch { best, alternatives };
    }

    Ok(out)
}
