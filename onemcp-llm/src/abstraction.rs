//! Provider-agnostic chat-completion contract.
//!
//! The indexer talks to whatever LLM backs an extraction run through this
//! trait alone; concrete provider SDKs (OpenAI, Anthropic, a local runtime,
//! whatever) live outside this crate and implement [`ChatCompletion`] against
//! their own client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{LlmError, Result};

/// The role a message plays in a chat-completion conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Configuration for a chat-completion call: which model, and how it should
/// behave. Deliberately provider-agnostic; a concrete `ChatCompletion`
/// implementation decides how to map this onto its own wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (e.g. "openai", "anthropic", "local"), used only for
    /// logging and error messages by this crate.
    pub name: String,

    pub model: String,

    pub endpoint: Option<String>,

    pub api_key: Option<String>,

    pub timeout_secs: Option<u64>,

    pub max_retries: Option<u32>,

    pub custom_config: HashMap<String, serde_json::Value>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            endpoint: None,
            api_key: None,
            timeout_secs: Some(30),
            max_retries: Some(3),
            custom_config: HashMap::new(),
        }
    }

    /// Load configuration from `{PREFIX}{NAME}_{API_KEY,ENDPOINT,MODEL,TIMEOUT,MAX_RETRIES}`.
    pub fn from_env(prefix: &str, name: &str) -> Result<Self> {
        let env_prefix = format!("{}{}_", prefix, name.to_uppercase());

        let api_key = std::env::var(format!("{env_prefix}API_KEY")).ok();
        let endpoint = std::env::var(format!("{env_prefix}ENDPOINT")).ok();
        let model = std::env::var(format!("{env_prefix}MODEL")).unwrap_or_else(|_| "default".to_string());

        Ok(Self {
            name: name.to_string(),
            endpoint,
            api_key,
            model,
            timeout_secs: std::env::var(format!("{env_prefix}TIMEOUT")).ok().and_then(|s| s.parse().ok()),
            max_retries: std::env::var(format!("{env_prefix}MAX_RETRIES")).ok().and_then(|s| s.parse().ok()),
            custom_config: HashMap::new(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chat-completion request.
///
/// `tools` is always empty: the coordinator never hands a model a function
/// to call, it only asks for raw text it then repairs into JSON. The field
/// still exists on the wire contract so a provider implementation can
/// assert that assumption rather than silently dropping tool definitions a
/// future caller might add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    /// Whether the provider may reuse a cached response for an identical
    /// request (e.g. prompt caching for the system/context portion of a
    /// chunk prompt that repeats across chunks in the same run).
    #[serde(default)]
    pub cacheable: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { messages, model: model.into(), temperature: None, max_tokens: None, tools: Vec::new(), cacheable: false }
    }

    #[must_use]
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// The contract the indexer depends on for turning a prompt into raw model
/// output. Everything past this point (JSON repair, graph validation) treats
/// the returned content as untrusted text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// The model this instance is configured to call.
    fn model(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Check the provider is reachable and configured correctly.
    async fn validate(&self) -> Result<()> {
        Err(LlmError::Configuration(format!("{} does not implement validate", self.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_defaults() {
        let config = ProviderConfig::new("openai", "gpt-4");
        assert_eq!(config.name, "openai");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.max_retries, Some(3));
    }

    #[test]
    fn chat_message_constructors_set_role() {
        assert_eq!(ChatMessage::system("hi").role, Role::System);
        assert_eq!(ChatMessage::user("hi").role, Role::User);
        assert_eq!(ChatMessage::assistant("hi").role, Role::Assistant);
    }
}
