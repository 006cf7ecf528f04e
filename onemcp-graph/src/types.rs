//! The handbook knowledge graph's node and edge types.
//!
//! Every node carries a logical key of the form `<kind>|<slug>` (see
//! `onemcp_core::key`). Nodes are append-only from the graph's point of view:
//! a driver's `store_node` is an upsert keyed on that string, never a patch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An API entity (a schema the handbook documents, e.g. `Sale`, `Customer`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityNode {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub service_slug: String,
    /// Operation keys the extractor associated with this entity, resolved
    /// (or dropped) when `HAS_OPERATION` edges are written.
    pub associated_operation_keys: Vec<String>,
    pub source: Option<String>,
    pub domain: Option<String>,
    #[serde(default)]
    pub attributes: Value,
}

/// A field on an entity. `owning_entity_key` must resolve to a stored
/// `EntityNode` or the `HAS_FIELD` edge synthesized for it is dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldNode {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub field_type: String,
    pub owning_entity_key: String,
    pub service_slug: String,
}

/// An API operation (one `method path` pair within a service).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationNode {
    pub key: String,
    pub operation_id: String,
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub service_slug: String,
    pub tags: Vec<String>,
    /// `METHOD path — summary` when the extractor doesn't supply one.
    pub signature: String,
    pub example_keys: Vec<String>,
    pub documentation_uri: Option<String>,
    /// Serialized JSON when the extractor gave a structured schema.
    pub request_schema: Option<String>,
    pub response_schema: Option<String>,
    /// Matched against `ContextItem.operations` at retrieval time.
    pub category: Option<String>,
    pub primary_entity_key: Option<String>,
}

impl OperationNode {
    /// `METHOD path — summary`, the default signature when none was extracted.
    #[must_use]
    pub fn default_signature(method: &str, path: &str, summary: Option<&str>) -> String {
        match summary {
            Some(s) if !s.is_empty() => format!("{method} {path} — {s}"),
            _ => format!("{method} {path}"),
        }
    }
}

/// A request/response example tied to an operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExampleNode {
    pub key: String,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Arbitrary UTF-8; serialized JSON when the extractor gave a structured body.
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub response_status: Option<String>,
    pub owning_operation_key: String,
    pub service_slug: String,
}

/// A documentation passage extracted from a handbook's Markdown. `content`
/// must be non-blank; the coordinator discards nodes that fail this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentationNode {
    pub key: String,
    pub title: Option<String>,
    pub content: String,
    pub doc_type: String,
    pub source_file: Option<String>,
    /// Entity keys matched by the keyword/alias pass; mirrors the `MENTIONS`
    /// edges written for this node.
    pub related_keys: Vec<String>,
    pub service_slug: String,
    #[serde(default)]
    pub metadata: Value,
}

impl DocumentationNode {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Tagged union of every node kind the graph stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphNode {
    Entity(EntityNode),
    Field(FieldNode),
    Operation(OperationNode),
    Example(ExampleNode),
    Documentation(DocumentationNode),
}

impl GraphNode {
    /// The logical key shared by every kind, `<kind>|<slug>`.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Entity(n) => &n.key,
            Self::Field(n) => &n.key,
            Self::Operation(n) => &n.key,
            Self::Example(n) => &n.key,
            Self::Documentation(n) => &n.key,
        }
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Entity(_) => "entity",
            Self::Field(_) => "field",
            Self::Operation(_) => "operation",
            Self::Example(_) => "example",
            Self::Documentation(_) => "documentation",
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&EntityNode> {
        match self {
            Self::Entity(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_operation(&self) -> Option<&OperationNode> {
        match self {
            Self::Operation(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_field(&self) -> Option<&FieldNode> {
        match self {
            Self::Field(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_example(&self) -> Option<&ExampleNode> {
        match self {
            Self::Example(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_documentation(&self) -> Option<&DocumentationNode> {
        match self {
            Self::Documentation(n) => Some(n),
            _ => None,
        }
    }
}

/// Well-known edge type labels. `edge_type` on [`GraphEdge`] is a plain
/// `String` (drivers and the coordinator only require it be upper-cased and
/// non-empty), but these are the ones the coordinator and retrieval service
/// actually write and traverse.
pub mod edge_types {
    pub const HAS_FIELD: &str = "HAS_FIELD";
    pub const HAS_OPERATION: &str = "HAS_OPERATION";
    pub const HAS_EXAMPLE: &str = "HAS_EXAMPLE";
    pub const DESCRIBES: &str = "DESCRIBES";
    pub const MENTIONS: &str = "MENTIONS";
}

/// A typed relationship between two node keys. `edge_type` must be
/// upper-cased and non-empty; `(from_key, edge_type, to_key)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub from_key: String,
    pub to_key: String,
    pub edge_type: String,
    pub description: Option<String>,
    pub strength: Option<f32>,
    #[serde(default)]
    pub properties: Value,
}

impl GraphEdge {
    #[must_use]
    pub fn new(from_key: impl Into<String>, edge_type: impl Into<String>, to_key: impl Into<String>) -> Self {
        Self {
            from_key: from_key.into(),
            to_key: to_key.into(),
            edge_type: edge_type.into().to_uppercase(),
            description: None,
            strength: None,
            properties: Value::Null,
        }
    }

    /// The `(fromKey, edgeType, toKey)` triple that must be unique across a
    /// handbook's edge collection.
    #[must_use]
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.from_key, &self.edge_type, &self.to_key)
    }
}

/// Outcome of a single `store_edge` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Stored,
    /// One or both endpoints aren't in the graph; the edge was dropped.
    SkippedMissingEndpoint,
}

/// Every node incident to a key, one hop away, grouped by `edge_type`. This
/// is the graph driver's generic traversal primitive; the retrieval service
/// composes several of these (and `get_node`) into its response bundles.
#[derive(Debug, Clone, Default)]
pub struct IncidentNodes {
    pub by_edge_type: std::collections::BTreeMap<String, Vec<GraphNode>>,
}

impl IncidentNodes {
    #[must_use]
    pub fn nodes_for(&self, edge_type: &str) -> &[GraphNode] {
        self.by_edge_type.get(edge_type).map_or(&[], Vec::as_slice)
    }
}
