//! Error type for chat-completion calls and response parsing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("invalid provider configuration: {0}")]
    Configuration(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("rate limited, retry after {0:?}")]
    RateLimited(Option<u64>),
}

pub type Result<T> = std::result::Result<T, LlmError>;
