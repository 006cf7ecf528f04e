//! Request and response types for the retrieval service (C8).
//!
//! A request names zero or more entities, each with an optional set of
//! operation category labels to filter by. The response offers the same
//! underlying graph data in two shapes: a flattened, entity-oriented list
//! suitable for dropping straight into a prompt, and an operation-oriented
//! grouping for callers that want to present "here's everything about this
//! endpoint" as a unit.

use serde::{Deserialize, Serialize};

/// How a context item was derived, preserved through retrieval as metadata
/// but never interpreted by the service itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Referral {
    Direct,
    Indirect,
}

/// One requested entity, plus the operation categories the caller wants
/// included for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    /// Entity display name; resolved to a canonical key internally.
    pub entity: String,
    /// Operation category labels to match against `OperationNode.category`.
    /// An empty list means every operation reachable from the entity is
    /// eligible.
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub referral: Option<Referral>,
}

/// A retrieval request: the list of entities (and per-entity operation
/// filters) to assemble context for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRequest {
    pub context: Vec<ContextItem>,
}

/// The kind of a single flattened context element, in the fixed ordering
/// the flattened-by-entity view emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Entity,
    Doc,
    Field,
    Signature,
    Example,
}

/// One piece of assembled context: rendered content plus a reference path
/// a caller can use to cite or re-fetch the source node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextElement {
    pub kind: ItemKind,
    pub content: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

/// The flattened-by-entity view of one requested `ContextItem`. Present
/// even when the entity didn't resolve, so the caller can always correlate
/// the response back to what it asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityGroup {
    pub entity: String,
    pub requested_operations: Vec<String>,
    pub confidence: Option<f32>,
    pub referral: Option<Referral>,
    /// `entity → doc → field → operations`, in that order; within
    /// `operations`, each matched operation contributes a signature item
    /// then its examples then its docs, in discovery order.
    pub items: Vec<ContextElement>,
}

/// The operation-oriented view: one group per operation reachable from any
/// requested entity and matching that entity's category filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationGroup {
    /// `METHOD path` display name.
    pub name: String,
    pub signature: Option<ContextElement>,
    pub examples: Vec<ContextElement>,
    /// Deduplicated globally per response by the documentation node's
    /// canonical key, so a doc shared by several operations appears once.
    pub docs: Vec<ContextElement>,
}

/// The full response to a [`ContextRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub flattened: Vec<EntityGroup>,
    pub operation_oriented: Vec<OperationGroup>,
}
