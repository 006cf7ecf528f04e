//! End-to-end retrieval scenarios against a populated in-memory graph,
//! exercising the flattened view's fixed item ordering and multi-entity
//! requests in one call.

use std::sync::Arc;

use onemcp_graph::{edge_types, DocumentationNode, EntityNode, ExampleNode, FieldNode, GraphDriver, GraphNode, InMemoryGraphDriver, OperationNode};
use onemcp_retrieval::{ContextItem, ContextRequest, ItemKind, RetrievalService};
use serde_json::Value;

async fn populated_driver() -> Arc<dyn GraphDriver> {
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
        .store_node(GraphNode::Entity(EntityNode {
            key: "entity|customer".into(),
            name: "Customer".into(),
            description: Some("A buyer.".into()),
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
    driver.store_edge(onemcp_graph::GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_total")).await.unwrap();

    driver
        .store_node(GraphNode::Documentation(DocumentationNode {
            key: "doc|refunds".into(),
            title: Some("Refund policy".into()),
            content: "Refunds are issued within 30 days.".into(),
            doc_type: "concept".into(),
            source_file: Some("refunds.md".into()),
            related_keys: vec!["entity|sale".into()],
            service_slug: "sales".into(),
            metadata: Value::Null,
        }))
        .await
        .unwrap();
    driver.store_edge(onemcp_graph::GraphEdge::new("doc|refunds", edge_types::MENTIONS, "entity|sale")).await.unwrap();

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
    driver.store_edge(onemcp_graph::GraphEdge::new("entity|sale", edge_types::HAS_OPERATION, "op|listsales")).await.unwrap();

    driver
        .store_node(GraphNode::Example(ExampleNode {
            key: "example|listsales_basic".into(),
            name: "basic".into(),
            summary: None,
            description: Some("A typical response.".into()),
            request_body: None,
            response_body: Some(r#"[{"id":1,"total":42}]"#.into()),
            response_status: Some("200".into()),
            owning_operation_key: "op|listsales".into(),
            service_slug: "sales".into(),
        }))
        .await
        .unwrap();
    driver.store_edge(onemcp_graph::GraphEdge::new("op|listsales", edge_types::HAS_EXAMPLE, "example|listsales_basic")).await.unwrap();

    driver
}

#[tokio::test]
async fn flattened_view_orders_items_entity_doc_field_then_operations() {
    let driver = populated_driver().await;
    let service = RetrievalService::new(driver);

    let response = service
        .retrieve(&ContextRequest {
            context: vec![ContextItem { entity: "Sale".into(), operations: vec![], confidence: Some(0.9), referral: None }],
        })
        .await
        .unwrap();

    let group = &response.flattened[0];
    let kinds: Vec<ItemKind> = group.items.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![ItemKind::Entity, ItemKind::Doc, ItemKind::Field, ItemKind::Signature, ItemKind::Example]);

    let example_item = group.items.iter().find(|i| matches!(i.kind, ItemKind::Example)).unwrap();
    assert!(example_item.content.contains("**basic**"));
    assert!(example_item.content.contains("A typical response."));
    assert!(example_item.content.contains("**Response:**"));
    assert!(!example_item.content.contains("**Request:**"), "blank request body should be omitted");
}

#[tokio::test]
async fn multiple_requested_entities_each_get_their_own_group() {
    let driver = populated_driver().await;
    let service = RetrievalService::new(driver);

    let response = service
        .retrieve(&ContextRequest {
            context: vec![
                ContextItem { entity: "Sale".into(), operations: vec!["Retrieve".into()], confidence: None, referral: None },
                ContextItem { entity: "Customer".into(), operations: vec![], confidence: None, referral: None },
            ],
        })
        .await
        .unwrap();

    assert_eq!(response.flattened.len(), 2);
    assert_eq!(response.flattened[0].entity, "Sale");
    assert_eq!(response.flattened[1].entity, "Customer");
    // Customer has no fields/operations/docs of its own beyond its entity item.
    assert_eq!(response.flattened[1].items.len(), 1);
    assert_eq!(response.operation_oriented.len(), 1, "only Sale's operation matched its filter");
}
