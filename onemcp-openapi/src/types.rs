//! Summaries and chunk shapes produced from a parsed OpenAPI document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tag declared in an OpenAPI document's top-level `tags` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub description: Option<String>,
}

/// High-level description of a service's OpenAPI document, independent of
/// any single chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecSummary {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub tags: Vec<TagInfo>,
    pub operation_count: usize,
}

/// One operation (`method path`) within a chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationEntry {
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Value,
    pub request_body: Option<Value>,
    pub responses: Value,
}

/// A self-contained group of at most `K` operations, plus every component
/// schema any of those operations transitively reference. Chunks from the
/// same service duplicate any schema referenced by more than one of them:
/// this is deliberate, so each chunk can be handed to an extraction pass in
/// isolation without also shipping the rest of the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationChunk {
    /// Stable identifier (`<service>#<chunk_index>`) so diagnostics and log
    /// sinks can correlate a chunk across the extraction run that produced
    /// it and the run that re-reads its artifacts.
    pub chunk_id: String,
    pub service: String,
    pub chunk_index: usize,
    pub operations: Vec<OperationEntry>,
    /// `schema name -> schema value`, the transitive closure of every
    /// `#/components/schemas/...` reference reachable from this chunk's
    /// operations.
    pub components: Value,
}
