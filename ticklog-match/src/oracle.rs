//! The remote scoring oracle: one prompt in, raw text out.
//!
//! Implementations live at the edge (HTTP in the CLI, scripted fakes in tests).

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("model not found or unsupported: {0}")]
    ModelNotFound(String),

    #[error("quota exceeded or rate limited: {0}")]
    QuotaExceeded(String),

    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("all {models} oracle models exhausted, last error: {last}")]
    Exhausted { models: usize, last: Box<OracleError> },
}

impl OracleError {
    /// Errors that move the cascade to the next model without retrying.
    pub fn skips_model(&self) -> bool {
        matches!(self, OracleError::ModelNotFound(_) | OracleError::QuotaExceeded(_))
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, OracleError>;
}
