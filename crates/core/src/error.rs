use thiserror::Error;

pub type OutreachResult<T> = Result<T, OutreachError>;

#[derive(Error, Debug)]
pub enum OutreachError {
    /// Missing sender account, contact missing the required channel, and
    /// similar problems an operator has to fix. Never retried automatically.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient transport failure (network, timeout, provider 5xx).
    #[error("Transport error: {0}")]
    Transport(String),

    /// AI content generation failure; recovered locally via template fallback.
    #[error("Generation error: {0}")]
    Generation(String),

    /// A referenced entity no longer exists or the flow is malformed.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Duplicate enrollment or an optimistic-concurrency version race.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OutreachError {
    /// Whether the next sweep should retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OutreachError::Transport(_) | OutreachError::Conflict(_))
    }
}
