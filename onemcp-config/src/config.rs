//! Handbook configuration: the keys the indexing/retrieval core actually
//! consumes (see the configuration-keys table in the top-level design doc).
//!
//! The core treats configuration as an external collaborator: it doesn't
//! own a scaffolding wizard or a layered profile system, it just reads a
//! TOML document and resolves a handful of dotted keys out of it, with
//! environment-variable overrides for secrets. Unresolved `${env:...}`
//! placeholders are treated as absent rather than as a literal value, so a
//! handbook can ship a config template without leaking the fact that a key
//! was never set in a given environment.

use std::path::Path;

use toml::Value;

use crate::error::{ConfigError, Result};

/// Top-level handbook configuration, loaded once per process and shared
/// (read-only) by the indexing coordinator and the retrieval service.
#[derive(Debug, Clone, Default)]
pub struct HandbookConfig {
    raw: Value,
}

impl HandbookConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(contents: &str, source: impl AsRef<Path>) -> Result<Self> {
        let raw: Value = toml::from_str(contents).map_err(|source_err| ConfigError::Parse {
            path: source.as_ref().display().to_string(),
            source: source_err,
        })?;
        Ok(Self { raw: resolve_env_placeholders(raw) })
    }

    /// Load and parse configuration from a file. Absence of the file is not
    /// an error here: the coordinator falls back to every key's default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::parse(&contents, path)
    }

    fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.raw;
        for segment in path {
            current = current.as_table()?.get(*segment)?;
        }
        Some(current)
    }

    /// `indexing.graph.driver` — driver id to resolve (`in-memory` by default).
    #[must_use]
    pub fn graph_driver(&self) -> String {
        self.get_path(&["indexing", "graph", "driver"])
            .and_then(Value::as_str)
            .unwrap_or("in-memory")
            .to_string()
    }

    /// `graph.indexing.clearOnStartup` — default true.
    #[must_use]
    pub fn clear_on_startup(&self) -> bool {
        self.get_path(&["graph", "indexing", "clearOnStartup"]).and_then(Value::as_bool).unwrap_or(true)
    }

    /// `graph.indexing.chunking.enabled` — global chunking default.
    #[must_use]
    pub fn chunking_enabled_default(&self) -> bool {
        self.get_path(&["graph", "indexing", "chunking", "enabled"]).and_then(Value::as_bool).unwrap_or(false)
    }

    /// `graph.indexing.chunking.<docType>.enabled`, falling back to the
    /// global default when the per-doc-type override is absent. `doc_type`
    /// is `"openapi"` or `"markdown"`.
    #[must_use]
    pub fn chunking_enabled_for(&self, doc_type: &str) -> bool {
        self.get_path(&["graph", "indexing", "chunking", doc_type, "enabled"])
            .and_then(Value::as_bool)
            .unwrap_or_else(|| self.chunking_enabled_default())
    }

    /// `indexing.graph.chunking.markdown.windowSizeTokens` — default 500.
    #[must_use]
    pub fn markdown_window_size_tokens(&self) -> usize {
        self.get_path(&["indexing", "graph", "chunking", "markdown", "windowSizeTokens"])
            .and_then(Value::as_integer)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(500)
    }

    /// `indexing.graph.chunking.markdown.overlapTokens` — default 64.
    #[must_use]
    pub fn markdown_overlap_tokens(&self) -> usize {
        self.get_path(&["indexing", "graph", "chunking", "markdown", "overlapTokens"])
            .and_then(Value::as_integer)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(64)
    }

    /// `indexing.graph.chunking.markdown.adaptive` — default true. When
    /// false, the coordinator derives fixed chunk parameters from
    /// `windowSizeTokens`/`overlapTokens` instead of `AdaptiveParams::compute`.
    #[must_use]
    pub fn markdown_adaptive(&self) -> bool {
        self.get_path(&["indexing", "graph", "chunking", "markdown", "adaptive"]).and_then(Value::as_bool).unwrap_or(true)
    }

    /// `llm.<provider>.<key>`, as a string. Provider credential values are
    /// opaque to the core; this is a narrow passthrough for whichever
    /// fields a `ChatCompletion` implementation needs.
    #[must_use]
    pub fn llm_value(&self, provider: &str, key: &str) -> Option<String> {
        self.get_path(&["llm", provider, key]).and_then(Value::as_str).map(str::to_string)
    }
}

/// Walk `value`, replacing any string of the form `${env:NAME}` with the
/// value of environment variable `NAME`. A placeholder whose variable is
/// unset is replaced with TOML's absence — removed from its parent table
/// (or, inside an array, dropped) — so downstream `get_path` lookups see it
/// as absent rather than as the literal placeholder text.
fn resolve_env_placeholders(value: Value) -> Value {
    match value {
        Value::String(s) => {
            if let Some(name) = s.strip_prefix("${env:").and_then(|rest| rest.strip_suffix('}')) {
                match std::env::var(name) {
                    Ok(v) => Value::String(v),
                    Err(_) => Value::Table(toml::map::Map::new()), // sentinel: see filter below
                }
            } else {
                Value::String(s)
            }
        }
        Value::Table(map) => {
            let mut out = toml::map::Map::new();
            for (k, v) in map {
                let resolved = resolve_env_placeholders(v);
                if !is_unresolved_sentinel(&resolved) {
                    out.insert(k, resolved);
                }
            }
            Value::Table(out)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(resolve_env_placeholders).filter(|v| !is_unresolved_sentinel(v)).collect())
        }
        other => other,
    }
}

/// An empty table is never a legitimate value for a leaf we resolved from a
/// string placeholder, so it's safe to use as the "treat as absent" marker.
fn is_unresolved_sentinel(value: &Value) -> bool {
    matches!(value, Value::Table(t) if t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_absent() {
        let config = HandbookConfig::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.graph_driver(), "in-memory");
        assert!(config.clear_on_startup());
        assert!(!config.chunking_enabled_default());
    }

    #[test]
    fn reads_dotted_keys_from_nested_tables() {
        let config = HandbookConfig::parse(
            r#"
[indexing.graph]
driver = "surreal"

[graph.indexing]
clearOnStartup = false

[graph.indexing.chunking]
enabled = true

[graph.indexing.chunking.openapi]
enabled = false
"#,
            "test.toml",
        )
        .unwrap();

        assert_eq!(config.graph_driver(), "surreal");
        assert!(!config.clear_on_startup());
        assert!(config.chunking_enabled_default());
        assert!(!config.chunking_enabled_for("openapi"));
        assert!(config.chunking_enabled_for("markdown"), "markdown falls back to the global default");
    }

    #[test]
    fn unresolved_env_placeholder_is_treated_as_absent() {
        std::env::remove_var("ONEMCP_TEST_UNSET_VAR_XYZ");
        let config = HandbookConfig::parse(
            r#"
[llm.openai]
api_key = "${env:ONEMCP_TEST_UNSET_VAR_XYZ}"
"#,
            "test.toml",
        )
        .unwrap();
        assert_eq!(config.llm_value("openai", "api_key"), None);
    }

    #[test]
    fn resolved_env_placeholder_is_substituted() {
        std::env::set_var("ONEMCP_TEST_SET_VAR_XYZ", "sk-test-123");
        let config = HandbookConfig::parse(
            r#"
[llm.openai]
api_key = "${env:ONEMCP_TEST_SET_VAR_XYZ}"
"#,
            "test.toml",
        )
        .unwrap();
        assert_eq!(config.llm_value("openai", "api_key"), Some("sk-test-123".to_string()));
        std::env::remove_var("ONEMCP_TEST_SET_VAR_XYZ");
    }

    #[test]
    fn markdown_windowing_defaults() {
        let config = HandbookConfig::default();
        assert_eq!(config.markdown_window_size_tokens(), 500);
        assert_eq!(config.markdown_overlap_tokens(), 64);
        assert!(config.markdown_adaptive());
    }
}
