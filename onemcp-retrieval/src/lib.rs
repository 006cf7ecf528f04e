//! The handbook retrieval service (C8): resolves a list of requested
//! entities into entity-oriented and operation-oriented context bundles.
//!
//! This crate is the read-only counterpart to `onemcp-indexer`. It never
//! writes to the graph; it only traverses what the indexing coordinator
//! already persisted through the same `onemcp-graph` driver SPI.

#![warn(missing_debug_implementations)]

pub mod error;
pub mod service;
pub mod types;

pub use error::{RetrievalError, Result};
pub use service::RetrievalService;
pub use types::{
    ContextElement, ContextItem, ContextRequest, ContextResponse, EntityGroup, ItemKind, OperationGroup, Referral,
};
