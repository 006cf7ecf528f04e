//! The retrieval service (C8): turns a list of requested entities into
//! entity-oriented and operation-oriented context bundles.
//!
//! The service holds a shared, read-only handle to a [`GraphDriver`]. It
//! never writes: every node and edge it returns was written by the
//! indexing coordinator in an earlier run. Concurrent `retrieve` calls are
//! always safe — there's no per-request mutable state beyond the response
//! being built.

use std::collections::HashSet;
use std::sync::Arc;

use onemcp_core::key::{make_key, NodeKind};
use onemcp_graph::{edge_types, DocumentationNode, EntityNode, FieldNode, GraphDriver, GraphNode, OperationNode};
use serde_json::Value;

use crate::error::Result;
use crate::types::{ContextElement, ContextItem, ContextRequest, ContextResponse, EntityGroup, ItemKind, OperationGroup};

/// Resolves and assembles context bundles from the handbook graph. Cheap to
/// clone: it's just an `Arc` around the driver.
#[derive(Clone)]
pub struct RetrievalService {
    driver: Arc<dyn GraphDriver>,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService").finish_non_exhaustive()
    }
}

impl RetrievalService {
    #[must_use]
    pub fn new(driver: Arc<dyn GraphDriver>) -> Self {
        Self { driver }
    }

    /// Resolve every item in `request.context` into an entity-oriented
    /// group and fold their matched operations into a deduplicated,
    /// operation-oriented view.
    pub async fn retrieve(&self, request: &ContextRequest) -> Result<ContextResponse> {
        let mut flattened = Vec::with_capacity(request.context.len());
        let mut operation_groups: Vec<OperationGroup> = Vec::new();
        let mut operations_seen: HashSet<String> = HashSet::new();
        let mut docs_seen_globally: HashSet<String> = HashSet::new();

        for item in &request.context {
            let group = self
                .resolve_item(item, &mut operation_groups, &mut operations_seen, &mut docs_seen_globally)
                .await?;
            flattened.push(group);
        }

        Ok(ContextResponse { flattened, operation_oriented: operation_groups })
    }

    async fn resolve_item(
        &self,
        item: &ContextItem,
        operation_groups: &mut Vec<OperationGroup>,
        operations_seen: &mut HashSet<String>,
        docs_seen_globally: &mut HashSet<String>,
    ) -> Result<EntityGroup> {
        let entity_key = resolve_entity_key(&item.entity);

        let Some(GraphNode::Entity(entity)) = self.driver.get_node(&entity_key).await? else {
            return Ok(empty_group(item));
        };

        let incident = self.driver.query_by_entity(&entity_key).await?;
        let mut items = Vec::new();
        let mut docs_seen_in_group: HashSet<String> = HashSet::new();

        items.push(ContextElement { kind: ItemKind::Entity, content: entity_content(&entity), reference: entity_ref(&entity) });

        for doc in documentation_of(&incident) {
            if docs_seen_in_group.insert(doc.key.clone()) {
                items.push(doc_element(doc));
            }
        }

        for field in incident.nodes_for(edge_types::HAS_FIELD) {
            if let Some(field) = field.as_field() {
                items.push(ContextElement { kind: ItemKind::Field, content: field_content(field), reference: field_ref(&entity, field) });
            }
        }

        for op_node in incident.nodes_for(edge_types::HAS_OPERATION) {
            let Some(op) = op_node.as_operation() else { continue };
            if !operation_matches(op, &item.operations) {
                continue;
            }

            let op_incident = self.driver.query_by_entity(&op.key).await?;
            let examples: Vec<ContextElement> = op_incident
                .nodes_for(edge_types::HAS_EXAMPLE)
                .iter()
                .filter_map(GraphNode::as_example)
                .map(|ex| ContextElement { kind: ItemKind::Example, content: example_content(ex), reference: operation_ref(op) })
                .collect();
            let op_docs: Vec<&DocumentationNode> = documentation_of(&op_incident);

            items.push(ContextElement { kind: ItemKind::Signature, content: signature_content(op), reference: operation_ref(op) });
            items.extend(examples.iter().cloned());
            for doc in &op_docs {
                if docs_seen_in_group.insert(doc.key.clone()) {
                    items.push(doc_element(doc));
                }
            }

            if operations_seen.insert(op.key.clone()) {
                let docs = op_docs
                    .into_iter()
                    .filter(|doc| docs_seen_globally.insert(doc.key.clone()))
                    .map(|doc| doc_element(doc))
                    .collect();
                operation_groups.push(OperationGroup {
                    name: format!("{} {}", op.method, op.path),
                    signature: Some(ContextElement { kind: ItemKind::Signature, content: signature_content(op), reference: operation_ref(op) }),
                    examples,
                    docs,
                });
            }
        }

        Ok(EntityGroup {
            entity: item.entity.clone(),
            requested_operations: item.operations.clone(),
            confidence: item.confidence,
            referral: item.referral,
            items,
        })
    }
}

fn empty_group(item: &ContextItem) -> EntityGroup {
    EntityGroup {
        entity: item.entity.clone(),
        requested_operations: item.operations.clone(),
        confidence: item.confidence,
        referral: item.referral,
        items: Vec::new(),
    }
}

/// Resolve a request's entity name to a canonical key. Accepts either a
/// bare display name (the documented contract) or an already-canonical
/// `entity|slug` key, so callers that cache keys from a prior response
/// don't get penalized for re-slugifying them.
fn resolve_entity_key(name: &str) -> String {
    if name.starts_with("entity|") {
        name.to_string()
    } else {
        make_key(NodeKind::Entity, name)
    }
}

fn operation_matches(op: &OperationNode, requested: &[String]) -> bool {
    requested.is_empty() || op.category.as_deref().is_some_and(|c| requested.iter().any(|r| r == c))
}

/// Nodes reachable one hop away via either `DESCRIBES` or `MENTIONS`,
/// narrowed to documentation nodes.
fn documentation_of(incident: &onemcp_graph::IncidentNodes) -> Vec<&DocumentationNode> {
    incident
        .nodes_for(edge_types::DESCRIBES)
        .iter()
        .chain(incident.nodes_for(edge_types::MENTIONS))
        .filter_map(GraphNode::as_documentation)
        .collect()
}

fn doc_element(doc: &DocumentationNode) -> ContextElement {
    ContextElement { kind: ItemKind::Doc, content: doc_content(doc), reference: doc_ref(doc) }
}

fn slug_of(key: &str) -> &str {
    key.rsplit('|').next().unwrap_or(key)
}

fn entity_ref(entity: &EntityNode) -> String {
    format!("/{}/entities/{}", entity.service_slug, slug_of(&entity.key))
}

fn field_ref(entity: &EntityNode, field: &FieldNode) -> String {
    format!("/entities/{}/fields/{}", slug_of(&entity.key), slug_of(&field.key))
}

fn doc_ref(doc: &DocumentationNode) -> String {
    format!("/docs/{}", slug_of(&doc.key))
}

/// The operation's own path, with a leading `/` guaranteed.
fn operation_ref(op: &OperationNode) -> String {
    if op.path.starts_with('/') {
        op.path.clone()
    } else {
        format!("/{}", op.path)
    }
}

fn entity_content(entity: &EntityNode) -> String {
    let mut parts = vec![entity.description.clone().unwrap_or_else(|| entity.name.clone())];
    append_attributes(&mut parts, &entity.attributes);
    parts.join("\n\n")
}

fn field_content(field: &FieldNode) -> String {
    match field.description.as_deref() {
        Some(d) if !d.trim().is_empty() => format!("**{}** ({}): {}", field.name, field.field_type, d),
        _ => format!("**{}** ({})", field.name, field.field_type),
    }
}

fn doc_content(doc: &DocumentationNode) -> String {
    match doc.title.as_deref() {
        Some(t) if !t.trim().is_empty() => format!("**{t}**\n\n{}", doc.content),
        _ => doc.content.clone(),
    }
}

fn signature_content(op: &OperationNode) -> String {
    op.signature.clone()
}

/// Render an example per the fixed template, omitting any section whose
/// source field is blank.
fn example_content(example: &onemcp_graph::ExampleNode) -> String {
    let mut parts = vec![format!("**{}**", example.name)];
    if let Some(desc) = example.description.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(desc.to_string());
    }
    if let Some(body) = example.request_body.as_deref().filter(|b| !b.trim().is_empty()) {
        parts.push(format!("**Request:**\n```json\n{body}\n```"));
    }
    if let Some(body) = example.response_body.as_deref().filter(|b| !b.trim().is_empty()) {
        parts.push(format!("**Response:**\n```json\n{body}\n```"));
    }
    parts.join("\n\n")
}

/// Append a node's `attributes`/`metadata` blob to `parts` as a pretty JSON
/// block, after stripping any backend-internal key (one beginning with
/// `_`, e.g. a document-graph backend's `_id`/`_rev`). A blank or null
/// blob contributes nothing.
fn append_attributes(parts: &mut Vec<String>, value: &Value) {
    let stripped = strip_internal_fields(value);
    let is_empty = match &stripped {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if !is_empty {
        parts.push(format!("```json\n{}\n```", serde_json::to_string_pretty(&stripped).unwrap_or_default()));
    }
}

/// Recursively drop any object key beginning with `_`.
fn strip_internal_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.iter().filter(|(k, _)| !k.starts_with('_')).map(|(k, v)| (k.clone(), strip_internal_fields(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_internal_fields).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onemcp_graph::{EdgeOutcome, ExampleNode, FieldNode, GraphEdge, InMemoryGraphDriver, OperationNode};

    async fn driver_with_sales() -> Arc<dyn GraphDriver> {
        let driver = Arc::new(InMemoryGraphDriver::new());
        driver.initialize().await.unwrap();

        driver
            .store_node(GraphNode::Entity(EntityNode {
                key: "entity|sale".into(),
                name: "Sale".into(),
                description: Some("A completed transaction.".into()),
                service_slug: "sales".into(),
                ..Default::default()
            }))
            .await
            .unwrap();

        driver
            .store_node(GraphNode::Field(FieldNode {
                key: "field|sale_total".into(),
                name: "total".into(),
                description: Some("Total amount charged.".into()),
                field_type: "number".into(),
                owning_entity_key: "entity|sale".into(),
                service_slug: "sales".into(),
            }))
            .await
            .unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_total")).await.unwrap();

        driver
            .store_node(GraphNode::Operation(OperationNode {
                key: "op|listsales".into(),
                operation_id: "listSales".into(),
                method: "GET".into(),
                path: "/sales".into(),
                summary: Some("List sales".into()),
                description: None,
                service_slug: "sales".into(),
                tags: vec!["Sale".into()],
                signature: "GET /sales — List sales".into(),
                example_keys: Vec::new(),
                documentation_uri: None,
                request_schema: None,
                response_schema: None,
                category: Some("Retrieve".into()),
                primary_entity_key: Some("entity|sale".into()),
            }))
            .await
            .unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_OPERATION, "op|listsales")).await.unwrap();

        driver
            .store_node(GraphNode::Example(ExampleNode {
                key: "example|listsales_basic".into(),
                name: "basic".into(),
                summary: None,
                description: None,
                request_body: None,
                response_body: Some(r#"[{"id":1}]"#.into()),
                response_status: Some("200".into()),
                owning_operation_key: "op|listsales".into(),
                service_slug: "sales".into(),
            }))
            .await
            .unwrap();
        driver.store_edge(GraphEdge::new("op|listsales", edge_types::HAS_EXAMPLE, "example|listsales_basic")).await.unwrap();

        driver
    }

    #[tokio::test]
    async fn unresolved_entity_returns_empty_group_preserving_request_shape() {
        let driver = Arc::new(InMemoryGraphDriver::new());
        driver.initialize().await.unwrap();
        let service = RetrievalService::new(driver);

        let response = service
            .retrieve(&ContextRequest {
                context: vec![ContextItem { entity: "Ghost".into(), operations: vec![], confidence: Some(0.5), referral: None }],
            })
            .await
            .unwrap();

        assert_eq!(response.flattened.len(), 1);
        assert_eq!(response.flattened[0].entity, "Ghost");
        assert!(response.flattened[0].items.is_empty());
        assert_eq!(response.flattened[0].confidence, Some(0.5));
        assert!(response.operation_oriented.is_empty());
    }

    #[tokio::test]
    async fn single_operation_request_returns_matched_group_and_signature_ref() {
        let driver = driver_with_sales().await;
        let service = RetrievalService::new(driver);

        let response = service
            .retrieve(&ContextRequest {
                context: vec![ContextItem { entity: "Sale".into(), operations: vec!["Retrieve".into()], confidence: None, referral: None }],
            })
            .await
            .unwrap();

        assert_eq!(response.operation_oriented.len(), 1);
        let group = &response.operation_oriented[0];
        assert_eq!(group.name, "GET /sales");
        let signature = group.signature.as_ref().unwrap();
        assert_eq!(signature.content, "GET /sales — List sales");
        assert_eq!(signature.reference, "/sales");
    }

    #[tokio::test]
    async fn operation_category_filter_excludes_non_matching_operations() {
        let driver = driver_with_sales().await;
        let service = RetrievalService::new(driver);

        let response = service
            .retrieve(&ContextRequest {
                context: vec![ContextItem { entity: "Sale".into(), operations: vec!["Compute".into()], confidence: None, referral: None }],
            })
            .await
            .unwrap();

        assert!(response.operation_oriented.is_empty());
        let items = &response.flattened[0].items;
        assert!(items.iter().any(|i| matches!(i.kind, ItemKind::Entity)));
        assert!(!items.iter().any(|i| matches!(i.kind, ItemKind::Signature)));
    }

    #[tokio::test]
    async fn empty_operations_filter_matches_every_operation() {
        let driver = driver_with_sales().await;
        let service = RetrievalService::new(driver);

        let response = service
            .retrieve(&ContextRequest { context: vec![ContextItem { entity: "Sale".into(), operations: vec![], confidence: None, referral: None }] })
            .await
            .unwrap();

        assert_eq!(response.operation_oriented.len(), 1);
    }

    #[tokio::test]
    async fn shared_documentation_is_deduplicated_globally_in_operation_view() {
        let driver = driver_with_sales().await;

        driver
            .store_node(GraphNode::Operation(OperationNode {
                key: "op|getsale".into(),
                operation_id: "getSale".into(),
                method: "GET".into(),
                path: "/sales/{id}".into(),
                summary: Some("Get a sale".into()),
                description: None,
                service_slug: "sales".into(),
                tags: vec!["Sale".into()],
                signature: "GET /sales/{id} — Get a sale".into(),
                example_keys: Vec::new(),
                documentation_uri: None,
                request_schema: None,
                response_schema: None,
                category: Some("Retrieve".into()),
                primary_entity_key: Some("entity|sale".into()),
            }))
            .await
            .unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_OPERATION, "op|getsale")).await.unwrap();

        driver
            .store_node(GraphNode::Documentation(DocumentationNode {
                key: "doc|pricing_rules".into(),
                title: Some("Pricing rules".into()),
                content: "How sale totals are computed.".into(),
                doc_type: "concept".into(),
                source_file: Some("pricing.md".into()),
                related_keys: vec!["entity|sale".into()],
                service_slug: "sales".into(),
                metadata: Value::Null,
            }))
            .await
            .unwrap();

        for op_key in ["op|listsales", "op|getsale"] {
            let outcome =
                driver.store_edge(GraphEdge::new("doc|pricing_rules", edge_types::MENTIONS, op_key)).await.unwrap();
            assert_eq!(outcome, EdgeOutcome::Stored);
        }

        let service = RetrievalService::new(driver);
        let response = service
            .retrieve(&ContextRequest {
                context: vec![ContextItem { entity: "Sale".into(), operations: vec![], confidence: None, referral: None }],
            })
            .await
            .unwrap();

        assert_eq!(response.operation_oriented.len(), 2);
        let total_docs: usize = response.operation_oriented.iter().map(|g| g.docs.len()).sum();
        assert_eq!(total_docs, 1, "the shared doc should appear in exactly one group");
    }

    #[tokio::test]
    async fn backend_internal_attribute_keys_are_stripped_from_entity_content() {
        let driver = Arc::new(InMemoryGraphDriver::new());
        driver.initialize().await.unwrap();
        driver
            .store_node(GraphNode::Entity(EntityNode {
                key: "entity|sale".into(),
                name: "Sale".into(),
                description: Some("desc".into()),
                service_slug: "sales".into(),
                attributes: serde_json::json!({"_id": "sales:1", "domain": "commerce"}),
                ..Default::default()
            }))
            .await
            .unwrap();

        let service = RetrievalService::new(driver);
        let response = service
            .retrieve(&ContextRequest { context: vec![ContextItem { entity: "Sale".into(), operations: vec![], confidence: None, referral: None }] })
            .await
            .unwrap();

        let entity_item = &response.flattened[0].items[0];
        assert!(!entity_item.content.contains("_id"));
        assert!(entity_item.content.contains("domain"));
    }
}
