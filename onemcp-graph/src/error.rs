//! Error types for graph driver operations.

use thiserror::Error;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors a graph driver can return.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("driver not initialized")]
    NotInitialized,

    #[error(transparent)]
    Core(#[from] onemcp_core::CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("surrealdb error: {0}")]
    SurrealDb(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for GraphError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GraphError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<surrealdb::Error> for GraphError {
    fn from(e: surrealdb::Error) -> Self {
        Self::SurrealDb(e.to_string())
    }
}
