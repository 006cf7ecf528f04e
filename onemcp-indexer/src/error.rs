//! Error taxonomy for the indexing coordinator.
//!
//! Mirrors `onemcp_core::CoreError`'s fatal/retryable/skip split but adds the
//! variants the coordinator itself raises (state machine misuse, graph
//! driver failures surfaced mid-run).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("handbook configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("graph driver not ready: {0}")]
    DriverNotReady(String),

    #[error("graph error: {0}")]
    Graph(#[from] onemcp_graph::GraphError),

    #[error("llm request failed: {0}")]
    LlmTransient(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("indexing run cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] onemcp_core::CoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
