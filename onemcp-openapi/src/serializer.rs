//! Serializing chunks for the prompt context builder: YAML by default (more
//! token-efficient and more readable in a prompt than JSON), falling back to
//! JSON if a chunk somehow fails to serialize as YAML.

use crate::error::{OpenApiError, Result};
use crate::types::OperationChunk;

/// Serialize a chunk to YAML, falling back to pretty JSON on failure.
pub fn serialize_chunk(chunk: &OperationChunk) -> Result<String> {
    match serde_yaml::to_string(chunk) {
        Ok(yaml) => Ok(yaml),
        Err(yaml_err) => {
            tracing::warn!(error = %yaml_err, "falling back to JSON for operation chunk");
            serde_json::to_string_pretty(chunk).map_err(|json_err| {
                OpenApiError::Serialize(format!("yaml: {yaml_err}; json: {json_err}"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_chunk_as_yaml() {
        let chunk = OperationChunk {
            chunk_id: "orders#0".into(),
            service: "orders".into(),
            chunk_index: 0,
            operations: Vec::new(),
            components: json!({}),
        };
        let yaml = serialize_chunk(&chunk).unwrap();
        assert!(yaml.contains("service: orders"));
    }
}
