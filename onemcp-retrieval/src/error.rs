//! Error types for the retrieval service.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors the retrieval service can return. Unlike the indexing coordinator,
/// retrieval never fails on "not found" — an unresolved entity yields an
/// empty result, not an error. These variants are reserved for failures of
/// the underlying graph driver itself.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Graph(#[from] onemcp_graph::GraphError),
}
