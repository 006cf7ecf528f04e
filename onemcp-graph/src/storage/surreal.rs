//! SurrealDB-backed graph driver.
//!
//! Embedded mode with the RocksDB storage engine: one file-backed database
//! per handbook, no external server. Nodes and edges are stored schemaless
//! since `GraphNode` is a tagged union rather than a single row shape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

use crate::error::Result;
use crate::traits::GraphDriver;
use crate::types::{EdgeOutcome, GraphEdge, GraphNode, IncidentNodes};
use onemcp_core::canonicalize_for_backend;

#[derive(Debug, Serialize, Deserialize)]
struct EdgeRecord {
    from_key: String,
    to_key: String,
    edge_type: String,
    description: Option<String>,
    strength: Option<f32>,
    #[serde(default)]
    properties: Value,
    /// Insertion sequence number, so traversal can be ordered by `ORDER BY
    /// seq` instead of relying on SurrealDB's unspecified default order.
    /// Preserved across an upsert of the same `(fromKey, edgeType, toKey)`
    /// triple rather than reassigned, so re-storing an edge never moves it.
    seq: i64,
}

impl EdgeRecord {
    fn from_edge(e: GraphEdge, seq: i64) -> Self {
        Self {
            from_key: e.from_key,
            to_key: e.to_key,
            edge_type: e.edge_type,
            description: e.description,
            strength: e.strength,
            properties: e.properties,
            seq,
        }
    }
}

impl From<EdgeRecord> for GraphEdge {
    fn from(r: EdgeRecord) -> Self {
        Self {
            from_key: r.from_key,
            to_key: r.to_key,
            edge_type: r.edge_type,
            description: r.description,
            strength: r.strength,
            properties: r.properties,
        }
    }
}

/// SurrealDB embedded (RocksDB) driver, one database file per handbook.
#[derive(Debug)]
pub struct SurrealGraphDriver {
    db: Surreal<Db>,
    data_dir: PathBuf,
    initialized: AtomicBool,
    /// Next edge insertion sequence number to hand out. Resumed from the
    /// highest `seq` already on disk at `initialize`, so reopening an
    /// existing handbook database never reuses or rewinds a sequence number.
    next_edge_seq: AtomicI64,
}

impl SurrealGraphDriver {
    /// Open (creating if absent) the database file under `data_dir`.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
        }

        let db_path = data_dir.join("onemcp-graph.db");
        let db = Surreal::new::<RocksDb>(db_path).await?;
        db.use_ns("onemcp").use_db("handbook").await?;

        Ok(Self { db, data_dir, initialized: AtomicBool::new(false), next_edge_seq: AtomicI64::new(0) })
    }

    /// Open a database in a fresh OS temp directory, for tests.
    pub async fn new_temp() -> Result<Self> {
        let temp_dir = std::env::temp_dir().join(format!("onemcp-graph-{}", uuid::Uuid::new_v4()));
        Self::new(temp_dir).await
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.db
            .query(
                "DEFINE TABLE IF NOT EXISTS nodes SCHEMALESS;
                 DEFINE INDEX IF NOT EXISTS idx_node_kind ON nodes FIELDS kind;
                 DEFINE TABLE IF NOT EXISTS edges SCHEMALESS;
                 DEFINE INDEX IF NOT EXISTS idx_edge_from ON edges FIELDS from_key;
                 DEFINE INDEX IF NOT EXISTS idx_edge_to ON edges FIELDS to_key;
                 DEFINE INDEX IF NOT EXISTS idx_edge_type ON edges FIELDS edge_type;
                 DEFINE INDEX IF NOT EXISTS idx_edge_seq ON edges FIELDS seq;",
            )
            .await?;
        self.restore_edge_seq_counter().await?;
        Ok(())
    }

    /// Resume the edge sequence counter from whatever's already on disk, so
    /// reopening an existing handbook database continues its insertion order
    /// instead of restarting at zero and interleaving with older edges.
    async fn restore_edge_seq_counter(&self) -> Result<()> {
        let mut response = self.db.query("SELECT math::max(seq) AS m FROM edges GROUP ALL").await?;
        #[derive(Deserialize)]
        struct MaxRow {
            m: Option<i64>,
        }
        let rows: Vec<MaxRow> = response.take(0)?;
        let max_seq = rows.into_iter().find_map(|r| r.m).unwrap_or(-1);
        self.next_edge_seq.fetch_max(max_seq + 1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl GraphDriver for SurrealGraphDriver {
    async fn initialize(&self) -> Result<()> {
        self.initialize_schema().await?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn clear_all(&self) -> Result<()> {
        self.db.query("DELETE FROM nodes; DELETE FROM edges;").await?;
        Ok(())
    }

    async fn ensure_graph_exists(&self) -> Result<()> {
        self.initialize_schema().await
    }

    async fn store_node(&self, node: GraphNode) -> Result<()> {
        let record_id = canonicalize_for_backend(node.key());
        let _: Option<GraphNode> = self.db.update(("nodes", record_id)).content(node).await?;
        Ok(())
    }

    async fn store_edge(&self, edge: GraphEdge) -> Result<EdgeOutcome> {
        if self.get_node(&edge.from_key).await?.is_none() || self.get_node(&edge.to_key).await?.is_none() {
            tracing::warn!(
                from = %edge.from_key,
                to = %edge.to_key,
                edge_type = %edge.edge_type,
                "dropping edge with missing endpoint"
            );
            return Ok(EdgeOutcome::SkippedMissingEndpoint);
        }

        let edge_id = canonicalize_for_backend(&format!("{}_{}_{}", edge.from_key, edge.edge_type, edge.to_key));
        let existing: Option<EdgeRecord> = self.db.select(("edges", edge_id.clone())).await?;
        let seq = existing.map_or_else(|| self.next_edge_seq.fetch_add(1, Ordering::SeqCst), |r| r.seq);
        let record = EdgeRecord::from_edge(edge, seq);
        let _: Option<EdgeRecord> = self.db.update(("edges", edge_id)).content(record).await?;
        Ok(EdgeOutcome::Stored)
    }

    async fn query_by_entity(&self, entity_key: &str) -> Result<IncidentNodes> {
        let mut incident: Vec<(i64, bool, GraphEdge)> = Vec::new();
        incident.extend(self.edges_from(entity_key).await?.into_iter().map(|(seq, edge)| (seq, true, edge)));
        incident.extend(self.edges_to(entity_key).await?.into_iter().map(|(seq, edge)| (seq, false, edge)));
        incident.sort_by_key(|(seq, ..)| *seq);

        let mut by_edge_type: BTreeMap<String, Vec<GraphNode>> = BTreeMap::new();
        for (_, outgoing, edge) in incident {
            let neighbor_key = if outgoing { &edge.to_key } else { &edge.from_key };
            if let Some(node) = self.get_node(neighbor_key).await? {
                by_edge_type.entry(edge.edge_type.clone()).or_default().push(node);
            }
        }

        Ok(IncidentNodes { by_edge_type })
    }

    async fn get_node(&self, key: &str) -> Result<Option<GraphNode>> {
        let record_id = canonicalize_for_backend(key);
        let node: Option<GraphNode> = self.db.select(("nodes", record_id)).await?;
        Ok(node)
    }

    async fn shutdown(&self) -> Result<()> {
        self.initialized.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl SurrealGraphDriver {
    async fn edges_from(&self, key: &str) -> Result<Vec<(i64, GraphEdge)>> {
        let mut response = self
            .db
            .query("SELECT * FROM edges WHERE from_key = $key ORDER BY seq")
            .bind(("key", key.to_string()))
            .await?;
        let records: Vec<EdgeRecord> = response.take(0)?;
        Ok(records.into_iter().map(|r| (r.seq, GraphEdge::from(r))).collect())
    }

    async fn edges_to(&self, key: &str) -> Result<Vec<(i64, GraphEdge)>> {
        let mut response = self
            .db
            .query("SELECT * FROM edges WHERE to_key = $key ORDER BY seq")
            .bind(("key", key.to_string()))
            .await?;
        let records: Vec<EdgeRecord> = response.take(0)?;
        Ok(records.into_iter().map(|r| (r.seq, GraphEdge::from(r))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{edge_types, EntityNode, FieldNode};

    fn entity(key: &str, name: &str) -> GraphNode {
        GraphNode::Entity(EntityNode { key: key.into(), name: name.into(), ..Default::default() })
    }

    fn field(key: &str, owning_entity_key: &str, name: &str) -> GraphNode {
        GraphNode::Field(FieldNode {
            key: key.into(),
            owning_entity_key: owning_entity_key.into(),
            name: name.into(),
            field_type: "string".into(),
            description: None,
            service_slug: "sales".into(),
        })
    }

    #[tokio::test]
    async fn new_temp_creates_database_directory() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        assert!(driver.data_dir().exists());
    }

    #[tokio::test]
    async fn store_and_fetch_node_roundtrips() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        driver.initialize().await.unwrap();
        driver.store_node(entity("entity|sale", "Sale")).await.unwrap();

        let fetched = driver.get_node("entity|sale").await.unwrap();
        match fetched {
            Some(GraphNode::Entity(e)) => assert_eq!(e.name, "Sale"),
            other => panic!("expected entity node, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_edge_drops_when_endpoint_missing() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        driver.initialize().await.unwrap();
        driver.store_node(entity("entity|sale", "Sale")).await.unwrap();

        let outcome =
            driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_total")).await.unwrap();

        assert_eq!(outcome, EdgeOutcome::SkippedMissingEndpoint);
        let incident = driver.query_by_entity("entity|sale").await.unwrap();
        assert!(incident.nodes_for(edge_types::HAS_FIELD).is_empty());
    }

    #[tokio::test]
    async fn query_by_entity_preserves_insertion_order_within_an_edge_type() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        driver.initialize().await.unwrap();
        driver.store_node(entity("entity|sale", "Sale")).await.unwrap();
        driver.store_node(field("field|sale_tax", "entity|sale", "tax")).await.unwrap();
        driver.store_node(field("field|sale_id", "entity|sale", "id")).await.unwrap();
        driver.store_node(field("field|sale_total", "entity|sale", "total")).await.unwrap();

        // Deliberately inserted out of key order so a storage engine's
        // natural scan order would not coincidentally match.
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_tax")).await.unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_id")).await.unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_total")).await.unwrap();

        let incident = driver.query_by_entity("entity|sale").await.unwrap();
        let fields = incident.nodes_for(edge_types::HAS_FIELD);
        let names: Vec<&str> = fields.iter().filter_map(|n| n.as_field().map(|f| f.name.as_str())).collect();
        assert_eq!(names, vec!["tax", "id", "total"]);
    }

    #[tokio::test]
    async fn query_by_entity_assembles_incident_nodes() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        driver.initialize().await.unwrap();
        driver.store_node(entity("entity|sale", "Sale")).await.unwrap();
        driver.store_node(field("field|sale_total", "entity|sale", "total")).await.unwrap();
        driver.store_edge(GraphEdge::new("entity|sale", edge_types::HAS_FIELD, "field|sale_total")).await.unwrap();

        let incident = driver.query_by_entity("entity|sale").await.unwrap();
        let fields = incident.nodes_for(edge_types::HAS_FIELD);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].as_field().unwrap().name, "total");
    }

    #[tokio::test]
    async fn clear_all_removes_everything() {
        let driver = SurrealGraphDriver::new_temp().await.unwrap();
        driver.initialize().await.unwrap();
        driver.store_node(entity("entity|sale", "Sale")).await.unwrap();
        driver.clear_all().await.unwrap();
        assert!(driver.get_node("entity|sale").await.unwrap().is_none());
    }
}
