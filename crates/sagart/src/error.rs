use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("max execution steps exceeded ({0})")]
    StepLimitExceeded(u64),

    #[error("invalid run config: {0}")]
    Config(#[from] serde_json::Error),
}
