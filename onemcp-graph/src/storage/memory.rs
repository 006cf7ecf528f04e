//! In-memory reference driver.
//!
//! Source of truth for the driver SPI's behavior: every other driver should
//! agree with this one on edge-cases like missing endpoints or repeated
//! `initialize` calls. Used directly in indexer and retrieval tests so their
//! suites don't depend on an embedded database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{GraphError, Result};
use crate::traits::GraphDriver;
use crate::types::{EdgeOutcome, GraphEdge, GraphNode, IncidentNodes};

#[derive(Debug, Default)]
struct Store {
    nodes: HashMap<String, GraphNode>,
    /// Keyed by `(fromKey, edgeType, toKey)` so `store_edge` is an upsert.
    /// Each entry carries the sequence number it was first inserted at, so
    /// traversal order is insertion order rather than `HashMap`'s randomized
    /// iteration order; an upsert of an already-present triple keeps its
    /// original sequence number instead of moving to the end.
    edges: HashMap<(String, String, String), (u64, GraphEdge)>,
    next_edge_seq: u64,
    initialized: bool,
}

/// An in-process, non-persistent graph driver.
#[derive(Debug, Default)]
pub struct InMemoryGraphDriver {
    store: RwLock<Store>,
}

impl InMemoryGraphDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every node currently stored, for test assertions.
    #[must_use]
    pub fn all_nodes(&self) -> Vec<GraphNode> {
        self.store.read().nodes.values().cloned().collect()
    }

    /// Snapshot of every edge currently stored, in insertion order, for test
    /// assertions.
    #[must_use]
    pub fn all_edges(&self) -> Vec<GraphEdge> {
        let store = self.store.read();
        let mut ordered: Vec<&(u64, GraphEdge)> = store.edges.values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        ordered.into_iter().map(|(_, edge)| edge.clone()).collect()
    }
}

#[async_trait]
impl GraphDriver for InMemoryGraphDriver {
    async fn initialize(&self) -> Result<()> {
        self.store.write().initialized = true;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.store.read().initialized
    }

    async fn clear_all(&self) -> Result<()> {
        let mut store = self.store.write();
        store.nodes.clear();
        store.edges.clear();
        Ok(())
    }

    async fn ensure_graph_exists(&self) -> Result<()> {
        if !self.is_initialized().await {
            return Err(GraphError::NotInitialized);
        }
        Ok(())
    }

    async fn store_node(&self, node: GraphNode) -> Result<()> {
        let mut store = self.store.write();
        store.nodes.insert(node.key().to_string(), node);
        Ok(())
    }

    async fn store_edge(&self, edge: GraphEdge) -> Result<EdgeOutcome> {
        let mut store = self.store.write();
        let from_present = store.nodes.contains_key(&edge.from_key);
        let to_present = store.nodes.contains_key(&edge.to_key);
        if !from_present || !to_present {
            tracing::warn!(
                from = %edge.from_key,
                to = %edge.to_key,
                edge_type = %edge.edge_type,
                "dropping edge with missing endpoint"
            );
            return Ok(EdgeOutcome::SkippedMissingEndpoint);
        }
        let triple = (edge.from_key.clone(), edge.edge_type.clone(), edge.to_key.clone());
        let seq = store.edges.get(&triple).map_or_else(
            || {
                let seq = store.next_edge_seq;
                store.next_edge_seq += 1;
                seq
            },
            |(seq, _)| *seq,
        );
        store.edges.insert(triple, (seq, edge));
        Ok(EdgeOutcome::Stored)
    }

    async fn query_by_entity(&self, entity_key: &str) -> Result<IncidentNodes> {
        let store = self.store.read();
        let mut matches: Vec<(u64, &GraphEdge, bool)> = Vec::new();

        for (seq, edge) in store.edges.values() {
            if edge.from_key == entity_key {
                matches.push((*seq, edge, true));
            } else if edge.to_key == entity_key {
                matches.push((*seq, edge, false));
            }
        }
        matches.sort_by_key(|(seq, ..)| *seq);

        let mut by_edge_type: BTreeMap<String, Vec<GraphNode>> = BTreeMap::new();
        for (_, edge, outgoing) in matches {
            let neighbor_key = if outgoing { &edge.to_key } else { &edge.from_key };
            if let Some(node) = store.nodes.get(neighbor_key) {
                by_edge_type.entry(edge.edge_type.clone()).or_default().push(node.clone());
            }
        }

        Ok(IncidentNodes { by_edge_type })
    }

    async fn get_node(&self, key: &str) -> Result<Option<GraphNode>> {
        Ok(self.store.read().nodes.get(key).cloned())
    }

    async fn shutdown(&self) -> Result<()> {
        self.store.write().initialized = false;
        Ok(())
    }
}
