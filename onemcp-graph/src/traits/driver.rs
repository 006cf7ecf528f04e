//! The graph driver SPI.
//!
//! Any storage engine can back the handbook graph by implementing this
//! trait. The indexing coordinator never sees the underlying database; it
//! only calls through `GraphDriver`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EdgeOutcome, GraphEdge, GraphNode, IncidentNodes};

#[async_trait]
pub trait GraphDriver: Send + Sync {
    /// Prepare the backend for use (open connections, run migrations).
    /// Calling `initialize` on an already-initialized driver is a no-op.
    async fn initialize(&self) -> Result<()>;

    /// Whether `initialize` has succeeded and not been undone by `shutdown`.
    async fn is_initialized(&self) -> bool;

    /// Remove every node and edge. Used at the start of a handbook re-index
    /// when the caller wants a clean slate rather than an incremental merge.
    async fn clear_all(&self) -> Result<()>;

    /// Ensure the schema/namespace backing this handbook exists, creating it
    /// if necessary. Idempotent.
    async fn ensure_graph_exists(&self) -> Result<()>;

    /// Insert or overwrite a node, keyed on `node.key()`.
    async fn store_node(&self, node: GraphNode) -> Result<()>;

    /// Insert or overwrite an edge, upserting by `(fromKey, edgeType,
    /// toKey)`. If either endpoint key is absent from the graph, the
    /// implementation drops the edge and logs a warning rather than failing
    /// the call: a dangling edge is never fatal to the indexing run.
    async fn store_edge(&self, edge: GraphEdge) -> Result<EdgeOutcome>;

    /// Fetch every node incident to `key`, one hop away, grouped by
    /// `edge_type`, in stable traversal order.
    async fn query_by_entity(&self, entity_key: &str) -> Result<IncidentNodes>;

    /// Fetch a single node by its exact key, regardless of kind.
    async fn get_node(&self, key: &str) -> Result<Option<GraphNode>>;

    /// Release any held resources (file handles, connections).
    async fn shutdown(&self) -> Result<()>;
}
