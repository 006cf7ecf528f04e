//! The handbook knowledge graph: node/edge types and a pluggable driver SPI.
//!
//! ```text
//! GraphDriver trait
//! ├── InMemoryGraphDriver (reference driver, used in tests)
//! └── SurrealGraphDriver (embedded RocksDB, used in production)
//! ```
//!
//! Every node is addressed by a logical key `<kind>|<slug>` (see
//! `onemcp_core::key`); drivers canonicalize that key for their own
//! identifier grammar but never change what it means.

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

pub use error::{GraphError, Result};
pub use storage::{InMemoryGraphDriver, SurrealGraphDriver};
pub use traits::GraphDriver;
pub use types::{
    edge_types, DocumentationNode, EdgeOutcome, EntityNode, ExampleNode, FieldNode, GraphEdge, GraphNode,
    IncidentNodes, OperationNode,
};
