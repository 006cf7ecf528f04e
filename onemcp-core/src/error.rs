//! Error taxonomy shared by every onemcp crate.
//!
//! Kinds mirror the propagation policy: per-chunk failures never escalate,
//! per-service failures escalate to the fallback extraction path, and
//! per-handbook failures escalate to the caller.

use thiserror::Error;

/// Result type alias used throughout onemcp.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur anywhere in the indexing or retrieval pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Required configuration is absent; fatal at boot.
    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    /// Filesystem or driver I/O failed.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    /// The graph driver has not been initialized, or a lazy re-init also failed.
    #[error("driver not ready: {0}")]
    DriverNotReady(String),

    /// An LLM call failed transiently (provider error, timeout). Retried once
    /// by the caller before being treated as a skipped chunk.
    #[error("llm transient error: {0}")]
    LlmTransient(String),

    /// The LLM response could not be coerced into valid JSON even after repair.
    #[error("llm malformed response: {0}")]
    LlmMalformed(String),

    /// A node or edge was dropped during validation; never fatal.
    #[error("validation skip: {0}")]
    ValidationSkip(String),

    /// An internal invariant was violated. Indicates a bug, kept for debuggability.
    #[error("state invariant violated: {0}")]
    StateInvariant(String),

    /// The operation was cancelled; partial state is left as-is.
    #[error("cancelled")]
    Cancelled,

    /// Backend storage error (driver transport failure, query failure).
    #[error("storage error: {0}")]
    Storage(String),

    /// Generic serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for errors that don't fit another kind.
    #[error("{0}")]
    Other(String),
}

impl From<String> for CoreError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for CoreError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl CoreError {
    /// Whether this error kind should abort the whole indexing run rather
    /// than being absorbed by a narrower fallback.
    #[must_use]
    pub const fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing(_) | Self::DriverNotReady(_) | Self::StateInvariant(_) | Self::Cancelled
        )
    }
}
