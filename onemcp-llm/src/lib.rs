//! Chat-completion contract depended on by the indexing coordinator, plus
//! recovery of structured data from raw LLM output.
//!
//! This crate does not talk to any model provider itself. It defines
//! [`ChatCompletion`] as the single seam between the rest of the workspace
//! and whatever chat-completion backend a deployment wires in, and it owns
//! [`parse_llm_json`], the repair pipeline that turns an extraction
//! response's raw text into structured data even when the model didn't
//! produce clean JSON.

pub mod abstraction;
pub mod error;
pub mod response_parser;

pub use abstraction::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse, ProviderConfig, Role, TokenUsage};
pub use error::{LlmError, Result};
pub use response_parser::{parse_llm_json, ParseOutcome};
