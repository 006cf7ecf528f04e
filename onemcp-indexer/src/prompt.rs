//! Prompt context assembly (C3).
//!
//! Turns one unit of extraction work — an OpenAPI operation chunk, a whole
//! spec, or a Markdown documentation chunk — into the system/user messages
//! handed to [`onemcp_llm::ChatCompletion`]. The coordinator decides *when*
//! to call the model; this module only decides *what to say*.

use onemcp_chunking::DocumentChunk;
use onemcp_llm::{ChatMessage, ChatRequest};
use onemcp_openapi::{OperationChunk, SpecSummary};

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a precise technical writer extracting a knowledge graph from API documentation. \
Respond with a single JSON object only, no prose and no code fences, with the keys: \
entities, fields, operations, examples, documentations, relationships. \
Use \"entity|<slug>\" style keys when you can derive one; otherwise omit the key and give a clear display name. \
Never invent operations, fields, or entities that aren't present in the supplied material.";

/// Build the request for one OpenAPI operation chunk.
#[must_use]
pub fn openapi_chunk_request(model: &str, summary: &SpecSummary, instructions: Option<&str>, chunk: &OperationChunk) -> ChatRequest {
    let mut context = String::new();
    context.push_str(&format!("# API: {} ({})\n\n", summary.title, summary.version));
    if let Some(description) = &summary.description {
        context.push_str(description);
        context.push_str("\n\n");
    }
    if let Some(instructions) = instructions {
        context.push_str("## Handbook instructions\n\n");
        context.push_str(instructions);
        context.push_str("\n\n");
    }
    context.push_str(&format!("## Operations (chunk {})\n\n", chunk.chunk_index));
    context.push_str(&serde_json::to_string_pretty(&chunk.operations).unwrap_or_default());
    context.push_str("\n\n## Referenced schemas\n\n");
    context.push_str(&serde_json::to_string_pretty(&chunk.components).unwrap_or_default());

    ChatRequest::new(model, vec![ChatMessage::system(EXTRACTION_SYSTEM_PROMPT), ChatMessage::user(context)]).cacheable(true)
}

/// Build the request for a whole (unchunked) spec, when chunked extraction
/// is disabled for this handbook.
#[must_use]
pub fn openapi_whole_spec_request(model: &str, summary: &SpecSummary, instructions: Option<&str>, raw_spec: &str) -> ChatRequest {
    let mut context = String::new();
    context.push_str(&format!("# API: {} ({})\n\n", summary.title, summary.version));
    if let Some(instructions) = instructions {
        context.push_str("## Handbook instructions\n\n");
        context.push_str(instructions);
        context.push_str("\n\n");
    }
    context.push_str("## Full OpenAPI document\n\n");
    context.push_str(raw_spec);

    ChatRequest::new(model, vec![ChatMessage::system(EXTRACTION_SYSTEM_PROMPT), ChatMessage::user(context)])
}

/// Build the request used to classify a Markdown documentation chunk and
/// match it against already-known entities.
#[must_use]
pub fn documentation_chunk_request(model: &str, chunk: &DocumentChunk, known_entities: &[String]) -> ChatRequest {
    let heading = if chunk.heading_path.is_empty() { "(no heading)".to_string() } else { chunk.heading_path.join(" > ") };

    let mut context = String::new();
    context.push_str(&format!("## Document: {} — {}\n\n", chunk.file_name, heading));
    context.push_str("Known entities in this handbook:\n");
    for entity in known_entities {
        context.push_str("- ");
        context.push_str(entity);
        context.push('\n');
    }
    context.push_str("\n## Passage\n\n");
    context.push_str(&chunk.content);

    let system = "You are tagging a documentation passage for a knowledge graph. \
Respond with a single JSON object only, with the keys: documentations (exactly one entry describing this passage) and relationships \
(MENTIONS edges from the documentation to any of the known entities it clearly discusses). \
Do not invent entities outside the supplied list.";

    ChatRequest::new(model, vec![ChatMessage::system(system), ChatMessage::user(context)]).cacheable(false)
}
