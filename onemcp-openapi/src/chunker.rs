//! Splitting a document's operations into self-contained chunks.

use std::collections::{HashMap, HashSet};

use openapiv3::OpenAPI;
use serde_json::{json, Value};

use crate::parser::operations_of;
use crate::types::{OperationChunk, OperationEntry};

/// Split every operation in `doc` into chunks of at most `max_per_chunk`
/// operations each, in path-then-method order for determinism. Each chunk
/// carries the transitive closure of every `#/components/schemas/...`
/// schema its operations reference, duplicated into the chunk rather than
/// left as a dangling reference to the rest of the document.
#[must_use]
pub fn chunk_operations(doc: &OpenAPI, service: &str, max_per_chunk: usize) -> Vec<OperationChunk> {
    let max_per_chunk = max_per_chunk.max(1);
    let entries = collect_operation_entries(doc);

    let components_value = doc.components.as_ref().map_or(Value::Null, |c| serde_json::to_value(&c.schemas).unwrap_or(Value::Null));

    entries
        .chunks(max_per_chunk)
        .enumerate()
        .map(|(chunk_index, ops)| {
            let mut refs = HashSet::new();
            for op in ops {
                collect_refs(&op.parameters, &mut refs);
                if let Some(body) = &op.request_body {
                    collect_refs(body, &mut refs);
                }
                collect_refs(&op.responses, &mut refs);
            }

            let components = resolve_closure(&refs, &components_value);

            OperationChunk {
                chunk_id: format!("{service}#{chunk_index}"),
                service: service.to_string(),
                chunk_index,
                operations: ops.to_vec(),
                components,
            }
        })
        .collect()
}

fn collect_operation_entries(doc: &OpenAPI) -> Vec<OperationEntry> {
    let mut entries: Vec<(String, String, OperationEntry)> = Vec::new();

    for (path, item) in &doc.paths.paths {
        let Some(item) = item.as_item() else { continue };
        for (method, op) in operations_of(item) {
            let parameters = serde_json::to_value(&op.parameters).unwrap_or(Value::Array(Vec::new()));
            let request_body = op.request_body.as_ref().map(|b| serde_json::to_value(b).unwrap_or(Value::Null));
            let responses = serde_json::to_value(&op.responses).unwrap_or(Value::Null);

            entries.push((
                path.clone(),
                method.to_string(),
                OperationEntry {
                    method: method.to_string(),
                    path: path.clone(),
                    operation_id: op.operation_id.clone(),
                    summary: op.summary.clone(),
                    description: op.description.clone(),
                    tags: op.tags.clone(),
                    parameters,
                    request_body,
                    responses,
                },
            ));
        }
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    entries.into_iter().map(|(_, _, entry)| entry).collect()
}

/// Recursively collect every `$ref` string value inside a JSON value.
fn collect_refs(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == "$ref" {
                    if let Value::String(s) = v {
                        out.insert(s.clone());
                    }
                } else {
                    collect_refs(v, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        _ => {}
    }
}

fn schema_name(reference: &str) -> Option<&str> {
    reference.strip_prefix("#/components/schemas/")
}

/// Resolve an initial set of schema refs into the full transitive closure,
/// following `$ref`s inside the resolved schemas themselves, and return the
/// result as a `{name: schema}` object.
fn resolve_closure(initial_refs: &HashSet<String>, components: &Value) -> Value {
    let mut resolved: HashMap<String, Value> = HashMap::new();
    let mut frontier: Vec<String> = initial_refs.iter().filter_map(|r| schema_name(r).map(str::to_string)).collect();

    while let Some(name) = frontier.pop() {
        if resolved.contains_key(&name) {
            continue;
        }
        let Some(schema) = components.get(&name) else {
            tracing::warn!(schema = %name, "referenced schema not found in components, skipping");
            continue;
        };

        let mut nested = HashSet::new();
        collect_refs(schema, &mut nested);
        for nested_ref in &nested {
            if let Some(nested_name) = schema_name(nested_ref) {
                frontier.push(nested_name.to_string());
            }
        }

        resolved.insert(name, schema.clone());
    }

    serde_json::to_value(resolved).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    const SPEC: &str = r#"
openapi: "3.0.0"
info:
  title: Orders API
  version: "1.0"
paths:
  /orders:
    get:
      summary: List orders
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: "#/components/schemas/Order"
  /orders/{id}:
    get:
      summary: Get an order
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Order"
  /customers:
    get:
      summary: List customers
      responses:
        "200":
          description: ok
components:
  schemas:
    Order:
      type: object
      properties:
        customer:
          $ref: "#/components/schemas/Customer"
    Customer:
      type: object
      properties:
        name:
          type: string
"#;

    #[test]
    fn groups_operations_by_max_per_chunk() {
        let doc = parse_document(SPEC).unwrap();
        let chunks = chunk_operations(&doc, "orders", 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].operations.len(), 2);
        assert_eq!(chunks[1].operations.len(), 1);
    }

    #[test]
    fn chunk_includes_transitive_component_closure() {
        let doc = parse_document(SPEC).unwrap();
        let chunks = chunk_operations(&doc, "orders", 1);
        let order_chunk = chunks.iter().find(|c| c.operations[0].path == "/orders/{id}").unwrap();
        assert!(order_chunk.components.get("Order").is_some());
        assert!(order_chunk.components.get("Customer").is_some(), "transitive ref should be pulled in too");
    }

    #[test]
    fn operation_without_refs_gets_empty_components() {
        let doc = parse_document(SPEC).unwrap();
        let chunks = chunk_operations(&doc, "orders", 1);
        let customers_chunk = chunks.iter().find(|c| c.operations[0].path == "/customers").unwrap();
        assert_eq!(customers_chunk.components, json!({}));
    }
}
