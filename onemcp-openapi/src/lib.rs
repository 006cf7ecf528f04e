//! Parsing OpenAPI documents and splitting them into self-contained
//! operation chunks for LLM-driven extraction.

pub mod chunker;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod types;

pub use chunker::chunk_operations;
pub use error::{OpenApiError, Result};
pub use parser::{parse_document, summarize};
pub use serializer::serialize_chunk;
pub use types::{OperationChunk, OperationEntry, SpecSummary, TagInfo};
