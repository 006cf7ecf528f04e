//! The indexing coordinator (C7): drives one handbook's `indexHandbook` run
//! from discovered OpenAPI services and Markdown docs through LLM-driven
//! extraction to a persisted knowledge graph.
//!
//! This crate is the sole writer of graph state (§3.3): it owns chunking
//! dispatch, prompt assembly, response parsing and repair, referential-
//! integrity enforcement, and the rule-based fallback path. Everything it
//! writes goes through `onemcp_graph::GraphDriver`; everything it reads back
//! out goes through `onemcp_retrieval` instead.

pub mod coordinator;
pub mod error;
pub mod extraction;
pub mod log_sink;
pub mod prompt;
pub mod state_machine;

pub use coordinator::{Cancellation, IndexingCoordinator};
pub use error::{IndexerError, Result};
pub use extraction::{map_extraction, ExtractionResponse, MappedGraph};
pub use log_sink::{ArtifactKind, FileLogSink, LogSink, NullLogSink};
pub use state_machine::{IndexingState, IndexingStateMachine, IndexingSummary};
