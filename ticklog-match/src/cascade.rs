//! Matching oracle client: model cascade, retries with backoff, and timeouts.
//!
//! Models are tried in order (primary, then fallbacks). Each model gets up to
//! `max_retries` attempts. "Model not found" and "quota" errors move to the
//! next model at once; timeouts and transport errors back off and retry.
//! Calls are strictly sequential.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use ticklog_core::{MatchCandidate, TicketRecord, TodoEntry};

use crate::oracle::{Oracle, OracleError};
use crate::prompt::build_prompt;
use crate::reply::{parse_reply, OracleTaskMatch, ReplyError};

#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    /// Attempts per model. Zero is treated as one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub batch_timeout: Duration,
    pub single_timeout: Duration,
}

pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-2.0-flash-lite", "gemini-1.5-flash"];

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            batch_timeout: Duration::from_secs(90),
            single_timeout: Duration::from_secs(30),
        }
    }
}

impl OracleConfig {
    /// Primary first, then fallbacks; blanks and repeats removed.
    pub fn models(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for m in std::iter::once(&self.primary_model).chain(self.fallback_models.iter()) {
            let m = m.trim();
            if !m.is_empty() && !out.iter().any(|o| o == m) {
                out.push(m.to_string());
            }
        }
        out
    }

    /// Delay after failed attempt `attempt` (0-based): base * 2^attempt, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Batch,
    Single,
}

/// Raw reply and the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleReply {
    pub model: String,
    pub text: String,
}

/// Why the oracle path produced nothing usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleFailure {
    #[error(transparent)]
    Unavailable(#[from] OracleError),

    #[error("oracle reply rejected: {0}")]
    Contract(#[from] ReplyError),
}

#[derive(Clone)]
pub struct MatchingOracleClient {
    oracle: Arc<dyn Oracle>,
    config: OracleConfig,
}

impl std::fmt::Debug for MatchingOracleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingOracleClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MatchingOracleClient {
    pub fn new(oracle: Arc<dyn Oracle>, config: OracleConfig) -> Self {
        Self { oracle, config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn timeout_for(&self, kind: CallKind) -> Duration {
        match kind {
            CallKind::Batch => self.config.batch_timeout,
            CallKind::Single => self.config.single_timeout,
        }
    }

    /// Run the prompt through the model cascade.
    pub async fn generate(&self, prompt: &str, kind: CallKind) -> Result<OracleReply, OracleError> {
        let models = self.config.models();
        let attempts = self.config.max_retries.max(1);
        let timeout = self.timeout_for(kind);
        let mut last: Option<OracleError> = None;

        for model in &models {
            for attempt in 0..attempts {
                debug!(model = %model, attempt = attempt + 1, "calling oracle");

                let result = match tokio::time::timeout(timeout, self.oracle.generate(prompt, model)).await {
                    Ok(r) => r,
                    Err(_) => Err(OracleError::Timeout(timeout)),
                };

                match result {
                    Ok(text) => {
                        info!(model = %model, attempt = attempt + 1, "oracle replied");
                        return Ok(OracleReply {
                            model: model.clone(),
                            text,
                        });
                    }
                    Err(e) if e.skips_model() => {
                        warn!(model = %model, error = %e, "advancing to next oracle model");
                        last = Some(e);
                        break;
                    }
                    Err(e) => {
                        warn!(model = %model, attempt = attempt + 1, error = %e, "oracle attempt failed");
                        last = Some(e);
                        if attempt + 1 < attempts {
                            tokio::time::sleep(self.config.backoff(attempt)).await;
                        }
                    }
                }
            }
        }

        Err(OracleError::Exhausted {
            models: models.len(),
            last: Box::new(last.unwrap_or_else(|| OracleError::Transport("no oracle models configured".to_string()))),
        })
    }

    async fn run(
        &self,
        entries: &[TodoEntry],
        preliminary: &[Vec<MatchCandidate>],
        tickets: &[Arc<TicketRecord>],
        kind: CallKind,
    ) -> Result<Vec<OracleTaskMatch>, OracleFailure> {
        let prompt = build_prompt(entries, preliminary, tickets);
        let reply = self.generate(&prompt, kind).await?;

        parse_reply(&reply.text, entries.len()).map_err(|e| {
            warn!(model = %reply.model, error = %e, raw = %reply.text, "oracle reply violated contract");
            OracleFailure::from(e)
        })
    }

    /// One call covering every task.
    pub async fn match_batch(
        &self,
        entries: &[TodoEntry],
        preliminary: &[Vec<MatchCandidate>],
        tickets: &[Arc<TicketRecord>],
    ) -> Result<Vec<OracleTaskMatch>, OracleFailure> {
        self.run(entries, preliminary, tickets, CallKind::Batch).await
    }

    /// One task, shorter timeout.
    pub async fn match_single(
        &self,
        entry: &TodoEntry,
        preliminary: &[MatchCandidate],
        tickets: &[Arc<TicketRecord>],
    ) -> Result<OracleTaskMatch, OracleFailure> {
        let prelim = vec![preliminary.to_vec()];
        let mut out = self
            .run(std::slice::from_ref(entry), &prelim, tickets, CallKind::Single)
            .await?;
        Ok(out.pop().unwrap_or_default())
    }
}
