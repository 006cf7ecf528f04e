//! Parsing OpenAPI documents, YAML-first with JSON as a fallback (valid JSON
//! parses as YAML in the common case, so the fallback mostly catches
//! documents whose JSON uses constructs YAML chokes on).

use openapiv3::OpenAPI;

use crate::error::{OpenApiError, Result};
use crate::types::{SpecSummary, TagInfo};

/// Parse `contents` as an OpenAPI 3.x document.
pub fn parse_document(contents: &str) -> Result<OpenAPI> {
    match serde_yaml::from_str::<OpenAPI>(contents) {
        Ok(doc) => Ok(doc),
        Err(yaml_err) => serde_json::from_str::<OpenAPI>(contents)
            .map_err(|json_err| OpenApiError::Parse(format!("yaml: {yaml_err}; json: {json_err}"))),
    }
}

/// Build a top-level summary of a parsed document: title, version,
/// description, declared tags, and the total operation count across every
/// path and HTTP method.
#[must_use]
pub fn summarize(doc: &OpenAPI) -> SpecSummary {
    let tags = doc.tags.iter().map(|t| TagInfo { name: t.name.clone(), description: t.description.clone() }).collect();

    let operation_count = doc
        .paths
        .paths
        .values()
        .filter_map(|item| item.as_item())
        .map(|item| operations_of(item).len())
        .sum();

    SpecSummary {
        title: doc.info.title.clone(),
        version: doc.info.version.clone(),
        description: doc.info.description.clone(),
        tags,
        operation_count,
    }
}

/// The `(method, operation)` pairs declared directly on a path item, in a
/// fixed method order so output is deterministic across runs.
pub(crate) fn operations_of(item: &openapiv3::PathItem) -> Vec<(&'static str, &openapiv3::Operation)> {
    let mut out = Vec::new();
    if let Some(op) = &item.get {
        out.push(("GET", op));
    }
    if let Some(op) = &item.put {
        out.push(("PUT", op));
    }
    if let Some(op) = &item.post {
        out.push(("POST", op));
    }
    if let Some(op) = &item.delete {
        out.push(("DELETE", op));
    }
    if let Some(op) = &item.options {
        out.push(("OPTIONS", op));
    }
    if let Some(op) = &item.head {
        out.push(("HEAD", op));
    }
    if let Some(op) = &item.patch {
        out.push(("PATCH", op));
    }
    if let Some(op) = &item.trace {
        out.push(("TRACE", op));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
openapi: "3.0.0"
info:
  title: Orders API
  version: "1.0"
  description: Manage orders
tags:
  - name: orders
    description: Order operations
paths:
  /orders:
    get:
      summary: List orders
      responses:
        "200":
          description: ok
  /orders/{id}:
    get:
      summary: Get an order
      responses:
        "200":
          description: ok
"#;

    #[test]
    fn parses_yaml_document() {
        let doc = parse_document(SPEC).unwrap();
        assert_eq!(doc.info.title, "Orders API");
    }

    #[test]
    fn summarizes_tags_and_operation_count() {
        let doc = parse_document(SPEC).unwrap();
        let summary = summarize(&doc);
        assert_eq!(summary.title, "Orders API");
        assert_eq!(summary.tags.len(), 1);
        assert_eq!(summary.operation_count, 2);
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(parse_document("not: [a, valid, openapi, doc").is_err());
    }
}
