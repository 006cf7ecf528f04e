//! Heading-aware Markdown chunking for handbook documentation.
//!
//! Chunk sizes adapt to the corpus being indexed: a handful of short docs get
//! large chunks so related material isn't fragmented, while a handbook with
//! many entities gets smaller, more focused chunks. Token counting prefers
//! `tiktoken-rs` and falls back to a deterministic bytes-per-4 heuristic
//! when a tokenizer isn't available for the configured model.

#![warn(missing_debug_implementations)]

pub mod chunking;

pub use chunking::{
    AdaptiveParams, ChunkingConfig, ChunkingStrategy, DocumentChunk, MarkdownChunker, SlidingWindowChunker,
    TiktokenCounter, TokenCounter, TokenCounterFactory,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
