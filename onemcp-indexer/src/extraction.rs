//! Mapping a parsed LLM extraction response onto the graph's node and edge
//! types.
//!
//! The model is asked for one JSON object with keys `entities`, `fields`,
//! `operations`, `examples`, `documentations`, `relationships`. Every raw
//! record is optimistic about what the model actually supplies: a `key` is
//! preferred when present, and synthesized from the display name (or from
//! `<parent_key>_<name>` for fields and examples) when it's not. This module
//! only maps one response (one chunk, or one whole-spec call) into graph
//! types; merging across chunks, referential-integrity filtering, and
//! dedup against a handbook-wide `validNodeKeys` set happens in the
//! coordinator once every chunk for a service has been mapped.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use onemcp_core::key::{make_key, make_scoped_key, slugify, NodeKind};
use onemcp_graph::{edge_types, DocumentationNode, EntityNode, ExampleNode, FieldNode, GraphEdge, GraphNode, OperationNode};

/// Raw entity record as the model emits it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    pub key: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub domain: Option<String>,
    #[serde(default)]
    pub attributes: Value,
    /// Operation names or keys this entity is associated with; turned into
    /// `HAS_OPERATION` edges once the referenced operation exists.
    #[serde(default)]
    pub associated_operations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawField {
    pub key: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub field_type: Option<String>,
    /// Owning entity, by display name or key.
    pub entity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOperation {
    pub key: Option<String>,
    pub operation_id: String,
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub signature: Option<String>,
    pub documentation_uri: Option<String>,
    #[serde(default)]
    pub request_schema: Option<Value>,
    #[serde(default)]
    pub response_schema: Option<Value>,
    pub category: Option<String>,
    /// Owning entity, by display name or key; optional since a chunk may
    /// describe an operation without an obvious owning entity.
    pub primary_entity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExample {
    pub key: Option<String>,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub request_body: Option<Value>,
    #[serde(default)]
    pub response_body: Option<Value>,
    #[serde(default)]
    pub response_status: Option<Value>,
    /// Owning operation, by display name (`METHOD path`), operationId, or key.
    pub operation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocumentation {
    pub key: Option<String>,
    pub title: Option<String>,
    pub content: String,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    pub source_file: Option<String>,
    #[serde(default)]
    pub related_entities: Vec<String>,
}

fn default_doc_type() -> String {
    "reference".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRelationship {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    pub description: Option<String>,
    pub strength: Option<f32>,
}

/// The raw shape of one LLM extraction response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
    #[serde(default)]
    pub examples: Vec<RawExample>,
    #[serde(default)]
    pub documentations: Vec<RawDocumentation>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
}

/// One mapped response: typed nodes plus the edges synthesized from
/// ownership fields (`HAS_FIELD`, `HAS_OPERATION`, `HAS_EXAMPLE`) and from
/// the model's own `relationships` list.
#[derive(Debug, Clone, Default)]
pub struct MappedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Map a single chunk's (or a whole-spec call's) extraction response onto
/// the graph model, synthesizing keys for any record the model didn't
/// supply one for.
#[must_use]
pub fn map_extraction(response: &ExtractionResponse, service_slug: &str) -> MappedGraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for raw in &response.entities {
        let key = raw.key.clone().unwrap_or_else(|| make_key(NodeKind::Entity, &raw.name));
        let associated = raw.associated_operations.iter().map(|op| resolve_ref(NodeKind::Operation, op)).collect();
        nodes.push(GraphNode::Entity(EntityNode {
            key,
            name: raw.name.clone(),
            description: raw.description.clone(),
            service_slug: service_slug.to_string(),
            associated_operation_keys: associated,
            source: raw.source.clone(),
            domain: raw.domain.clone(),
            attributes: raw.attributes.clone(),
        }));
    }

    for raw in &response.fields {
        let owning_entity_key = resolve_ref(NodeKind::Entity, &raw.entity);
        let key = raw.key.clone().unwrap_or_else(|| make_scoped_key(NodeKind::Field, &owning_entity_key, &raw.name));
        nodes.push(GraphNode::Field(FieldNode {
            key: key.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            field_type: raw.field_type.clone().unwrap_or_else(|| "string".to_string()),
            owning_entity_key: owning_entity_key.clone(),
            service_slug: service_slug.to_string(),
        }));
        edges.push(GraphEdge::new(owning_entity_key, edge_types::HAS_FIELD, key));
    }

    for raw in &response.operations {
        let key = raw.key.clone().unwrap_or_else(|| make_key(NodeKind::Operation, &raw.operation_id));
        let signature = raw
            .signature
            .clone()
            .unwrap_or_else(|| OperationNode::default_signature(&raw.method, &raw.path, raw.summary.as_deref()));
        let primary_entity_key = raw.primary_entity.as_ref().map(|e| resolve_ref(NodeKind::Entity, e));

        if let Some(entity_key) = &primary_entity_key {
            edges.push(GraphEdge::new(entity_key.clone(), edge_types::HAS_OPERATION, key.clone()));
        }

        nodes.push(GraphNode::Operation(OperationNode {
            key,
            operation_id: raw.operation_id.clone(),
            method: raw.method.to_uppercase(),
            path: raw.path.clone(),
            summary: raw.summary.clone(),
            description: raw.description.clone(),
            service_slug: service_slug.to_string(),
            tags: raw.tags.clone(),
            signature,
            example_keys: Vec::new(),
            documentation_uri: raw.documentation_uri.clone(),
            request_schema: raw.request_schema.as_ref().map(value_to_string),
            response_schema: raw.response_schema.as_ref().map(value_to_string),
            category: raw.category.clone(),
            primary_entity_key,
        }));
    }

    for raw in &response.examples {
        let owning_operation_key = resolve_ref(NodeKind::Operation, &raw.operation);
        let key = raw.key.clone().unwrap_or_else(|| make_scoped_key(NodeKind::Example, &owning_operation_key, &raw.name));
        edges.push(GraphEdge::new(owning_operation_key.clone(), edge_types::HAS_EXAMPLE, key.clone()));
        nodes.push(GraphNode::Example(ExampleNode {
            key,
            name: raw.name.clone(),
            summary: raw.summary.clone(),
            description: raw.description.clone(),
            request_body: raw.request_body.as_ref().map(value_to_string),
            response_body: raw.response_body.as_ref().map(value_to_string),
            response_status: raw.response_status.as_ref().map(value_to_string),
            owning_operation_key,
            service_slug: service_slug.to_string(),
        }));
    }

    for raw in &response.documentations {
        let key = raw.key.clone().unwrap_or_else(|| make_key(NodeKind::Doc, raw.title.as_deref().unwrap_or(&raw.content)));
        let related_keys: Vec<String> = raw.related_entities.iter().map(|e| resolve_ref(NodeKind::Entity, e)).collect();
        for related in &related_keys {
            edges.push(GraphEdge::new(key.clone(), edge_types::MENTIONS, related.clone()));
        }
        nodes.push(GraphNode::Documentation(DocumentationNode {
            key,
            title: raw.title.clone(),
            content: raw.content.clone(),
            doc_type: raw.doc_type.clone(),
            source_file: raw.source_file.clone(),
            related_keys,
            service_slug: service_slug.to_string(),
            metadata: Value::Null,
        }));
    }

    for raw in &response.relationships {
        if raw.edge_type.trim().is_empty() {
            continue;
        }
        let mut edge = GraphEdge::new(resolve_loose_ref(&raw.from), raw.edge_type.clone(), resolve_loose_ref(&raw.to));
        edge.description = raw.description.clone();
        edge.strength = raw.strength;
        edges.push(edge);
    }

    MappedGraph { nodes, edges }
}

/// Resolve a model-supplied reference (display name or already-a-key) to a
/// canonical key of kind `kind`.
fn resolve_ref(kind: NodeKind, raw: &str) -> String {
    if looks_like_key(raw) {
        raw.to_string()
    } else {
        make_key(kind, raw)
    }
}

/// Same as [`resolve_ref`] but for the free-form `relationships` list, where
/// the model names an endpoint without declaring its kind. If it already
/// looks like `kind|slug`, keep it; otherwise slugify it as-is and let the
/// coordinator's `validNodeKeys` filter drop it if nothing matches.
fn resolve_loose_ref(raw: &str) -> String {
    if looks_like_key(raw) {
        raw.to_string()
    } else {
        slugify(raw)
    }
}

fn looks_like_key(raw: &str) -> bool {
    raw.contains('|') && raw.split('|').next().is_some_and(|prefix| {
        matches!(prefix, "entity" | "field" | "op" | "example" | "doc")
    })
}

/// Coerce a JSON value into the string form the graph model stores for
/// schema/body fields: pass strings through, serialize anything else.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Build a name index (slugified display name -> key) for a set of mapped
/// nodes of a given kind, used by the documentation entity-matching pass.
#[must_use]
pub fn entity_name_index(nodes: &[GraphNode]) -> HashMap<String, String> {
    nodes
        .iter()
        .filter_map(GraphNode::as_entity)
        .map(|e| (slugify(&e.name), e.key.clone()))
        .collect()
}
