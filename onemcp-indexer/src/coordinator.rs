//! The indexing coordinator (C7): drives one `indexHandbook` run end to end.
//!
//! One [`IndexingCoordinator`] owns a single handbook's indexing run: it
//! loads declared services, extracts entities/fields/operations/examples
//! via the configured LLM (falling back to a rule-based pass per service if
//! extraction throws), extracts documentation from Markdown, and persists
//! everything through the [`GraphDriver`] SPI in the order referential
//! integrity requires — every node kind before any edge that references it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use onemcp_chunking::MarkdownChunker;
use onemcp_config::HandbookConfig;
use onemcp_core::{HandbookLayout, ProgressEvent, ProgressSink, ProgressStatus};
use onemcp_graph::{EdgeOutcome, GraphDriver, GraphEdge, GraphNode};
use onemcp_llm::{ChatCompletion, ChatMessage, ChatRequest, ParseOutcome};
use onemcp_openapi::{chunk_operations, parse_document, summarize};

use crate::error::{IndexerError, Result};
use crate::extraction::{entity_name_index, map_extraction, ExtractionResponse, MappedGraph};
use crate::log_sink::{ArtifactKind, LogSink};
use crate::prompt::{documentation_chunk_request, openapi_chunk_request, openapi_whole_spec_request};
use crate::state_machine::{IndexingState, IndexingStateMachine, IndexingSummary};

/// Operations per chunk when chunked extraction is in effect. Within the
/// 5-15 range the spec leaves open; 10 is a reasonable midpoint that still
/// keeps a chunk's prompt small.
const DEFAULT_OPERATIONS_PER_CHUNK: usize = 10;

/// A shared flag any long-running step can check to honor a cancellation
/// request without threading a `tokio::select!` through every await point.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a single handbook's `indexHandbook` run.
pub struct IndexingCoordinator {
    handbook: HandbookLayout,
    config: HandbookConfig,
    driver: Arc<dyn GraphDriver>,
    llm: Arc<dyn ChatCompletion>,
    progress: Arc<dyn ProgressSink>,
    log_sink: Arc<dyn LogSink>,
    state: IndexingStateMachine,
}

impl IndexingCoordinator {
    #[must_use]
    pub fn new(
        handbook: HandbookLayout,
        config: HandbookConfig,
        driver: Arc<dyn GraphDriver>,
        llm: Arc<dyn ChatCompletion>,
        progress: Arc<dyn ProgressSink>,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let state = IndexingStateMachine::new(handbook.manifest.name.clone());
        Self { handbook, config, driver, llm, progress, log_sink, state }
    }

    #[must_use]
    pub fn state(&self) -> IndexingState {
        self.state.current()
    }

    fn report(&self, completed: u64, total: u64, message: impl Into<String>, status: ProgressStatus) {
        self.progress.report(
            ProgressEvent::running(&self.handbook.manifest.name, "index-handbook", completed, total)
                .with_message(message)
                .with_status(status),
        );
    }

    /// Run the full indexing pipeline for this handbook. Returns a summary
    /// of everything persisted (and everything skipped) on success.
    pub async fn index_handbook(&self, cancel: &Cancellation) -> Result<IndexingSummary> {
        match self.run(cancel).await {
            Ok(summary) => {
                self.state.transition_to(IndexingState::Done, None)?;
                self.report(1, 1, "indexing complete", ProgressStatus::Completed);
                Ok(summary)
            }
            Err(e) => {
                self.state.fail(&e.to_string());
                let status = if matches!(e, IndexerError::Cancelled) { ProgressStatus::Cancelled } else { ProgressStatus::Failed };
                self.report(0, 1, e.to_string(), status);
                Err(e)
            }
        }
    }

    async fn run(&self, cancel: &Cancellation) -> Result<IndexingSummary> {
        self.state.transition_to(IndexingState::Initializing, None)?;
        self.initialize_driver().await?;

        self.state.transition_to(IndexingState::LoadingServices, None)?;
        let apis = self.handbook.manifest.apis.clone();
        let instructions = self.handbook.read_instructions().map_err(IndexerError::from)?;

        self.state.transition_to(IndexingState::ExtractingOperations, None)?;
        let mut summary = IndexingSummary::default();
        let mut valid_keys: HashSet<String> = HashSet::new();
        let mut known_entity_names: HashMap<String, String> = HashMap::new();

        for (index, api) in apis.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(IndexerError::Cancelled);
            }
            self.report(index as u64, apis.len() as u64, format!("extracting {}", api.name), ProgressStatus::Running);

            let (service_graph, fell_back) = self.extract_service(api, instructions.as_deref()).await;
            known_entity_names.extend(entity_name_index(&service_graph.nodes));
            if fell_back {
                summary.services_fallen_back.push(api.name.clone());
            }

            // Persist this service's nodes, then its edges, before moving to
            // the next service — the referential-integrity guarantee is
            // per-service, not deferred to a single end-of-run pass.
            self.persist_mapped_graph(service_graph, &mut valid_keys, &mut summary).await?;
        }

        self.state.transition_to(IndexingState::ValidatingDedupWrite, None)?;
        self.state.transition_to(IndexingState::ExtractingDocumentation, None)?;
        self.extract_documentation(&known_entity_names, &mut valid_keys, &mut summary, cancel).await?;

        self.state.transition_to(IndexingState::EnsuringGraphExists, None)?;
        self.driver.ensure_graph_exists().await.map_err(IndexerError::from)?;

        Ok(summary)
    }

    async fn initialize_driver(&self) -> Result<()> {
        if !self.driver.is_initialized().await {
            self.driver.initialize().await.map_err(|e| IndexerError::DriverNotReady(e.to_string()))?;
        }
        if self.config.clear_on_startup() {
            self.driver.clear_all().await?;
        }
        self.driver.ensure_graph_exists().await?;
        Ok(())
    }

    /// Extract one service's graph, either via chunked or whole-spec LLM
    /// extraction. Any failure while reading, parsing, or extracting the
    /// service falls back to rule-based extraction from the OpenAPI
    /// document's own structure rather than losing the service entirely.
    async fn extract_service(&self, api: &onemcp_core::ApiEntry, instructions: Option<&str>) -> (MappedGraph, bool) {
        let service_slug = onemcp_core::slugify(&api.name);

        let attempt = async {
            let raw_spec = std::fs::read_to_string(self.handbook.api_spec_path(api))
                .map_err(|e| anyhow::anyhow!("reading {}: {e}", api.name))?;
            let doc = parse_document(&raw_spec).map_err(|e| anyhow::anyhow!("parsing {}: {e}", api.name))?;
            let summary = summarize(&doc);

            let mapped = if self.config.chunking_enabled_for("openapi") {
                let chunks = chunk_operations(&doc, &service_slug, DEFAULT_OPERATIONS_PER_CHUNK);
                let mut merged = MappedGraph::default();
                for chunk in &chunks {
                    let request = openapi_chunk_request(self.llm.model(), &summary, instructions, chunk);
                    if let Some(response) = self.call_llm_with_retry(request, &chunk.chunk_id).await {
                        if let Some(parsed) = self.parse_extraction(&response, &chunk.chunk_id) {
                            let piece = map_extraction(&parsed, &service_slug);
                            merged.nodes.extend(piece.nodes);
                            merged.edges.extend(piece.edges);
                        }
                    }
                }
                merged
            } else {
                let request = openapi_whole_spec_request(self.llm.model(), &summary, instructions, &raw_spec);
                match self.call_llm_with_retry(request, &service_slug).await {
                    Some(response) => match self.parse_extraction(&response, &service_slug) {
                        Some(parsed) => map_extraction(&parsed, &service_slug),
                        None => return Err(anyhow::anyhow!("{} produced no usable extraction", api.name)),
                    },
                    None => return Err(anyhow::anyhow!("{} had no successful extraction call", api.name)),
                }
            };

            if mapped.nodes.is_empty() {
                return Err(anyhow::anyhow!("{} extraction yielded no nodes", api.name));
            }

            Ok(mapped)
        };

        match attempt.await {
            Ok(mapped) => (mapped, false),
            Err(e) => {
                tracing::warn!(service = %api.name, error = %e, "falling back to rule-based extraction");
                (self.rule_based_fallback(api, &service_slug), true)
            }
        }
    }

    /// Entities from OpenAPI tags, operations from path/method pairs, one
    /// `HAS_OPERATION` edge per tag-entity to each operation carrying that
    /// tag. Used when LLM-driven extraction for a service can't be trusted.
    fn rule_based_fallback(&self, api: &onemcp_core::ApiEntry, service_slug: &str) -> MappedGraph {
        let mut mapped = MappedGraph::default();
        let Ok(raw_spec) = std::fs::read_to_string(self.handbook.api_spec_path(api)) else {
            return mapped;
        };
        let Ok(doc) = parse_document(&raw_spec) else {
            return mapped;
        };
        let summary = summarize(&doc);
        let chunk = chunk_operations(&doc, service_slug, usize::MAX).into_iter().next().unwrap_or_else(|| onemcp_openapi::OperationChunk {
            chunk_id: format!("{service_slug}#fallback"),
            service: service_slug.to_string(),
            chunk_index: 0,
            operations: Vec::new(),
            components: serde_json::Value::Null,
        });

        for tag in &summary.tags {
            let entity_key = onemcp_core::make_key(onemcp_core::NodeKind::Entity, &tag.name);
            mapped.nodes.push(GraphNode::Entity(onemcp_graph::EntityNode {
                key: entity_key.clone(),
                name: tag.name.clone(),
                description: tag.description.clone(),
                service_slug: service_slug.to_string(),
                associated_operation_keys: Vec::new(),
                source: Some("fallback:tag".to_string()),
                domain: None,
                attributes: serde_json::Value::Null,
            }));

            for op in chunk.operations.iter().filter(|o| o.tags.iter().any(|t| t == &tag.name)) {
                let op_display = op.operation_id.clone().unwrap_or_else(|| format!("{} {}", op.method, op.path));
                let op_key = onemcp_core::make_key(onemcp_core::NodeKind::Operation, &op_display);
                mapped.edges.push(GraphEdge::new(entity_key.clone(), onemcp_graph::edge_types::HAS_OPERATION, op_key));
            }
        }

        for op in &chunk.operations {
            let op_display = op.operation_id.clone().unwrap_or_else(|| format!("{} {}", op.method, op.path));
            let key = onemcp_core::make_key(onemcp_core::NodeKind::Operation, &op_display);
            mapped.nodes.push(GraphNode::Operation(onemcp_graph::OperationNode {
                key,
                operation_id: op_display.clone(),
                method: op.method.clone(),
                path: op.path.clone(),
                summary: op.summary.clone(),
                description: op.description.clone(),
                service_slug: service_slug.to_string(),
                tags: op.tags.clone(),
                signature: onemcp_graph::OperationNode::default_signature(&op.method, &op.path, op.summary.as_deref()),
                example_keys: Vec::new(),
                documentation_uri: None,
                request_schema: None,
                response_schema: None,
                category: None,
                primary_entity_key: None,
            }));
        }

        mapped
    }

    /// Call the model, retrying once with a corrective follow-up message if
    /// the first attempt fails outright (provider error, timeout, rate
    /// limit). Two failures in a row give up on this chunk; the caller
    /// treats a `None` as a skipped chunk, never as a run failure.
    async fn call_llm_with_retry(&self, request: ChatRequest, label: &str) -> Option<String> {
        self.log_sink.write(ArtifactKind::Prompt, label, &serde_json::to_string_pretty(&request).unwrap_or_default());

        match self.llm.complete(request.clone()).await {
            Ok(response) => {
                self.log_sink.write(ArtifactKind::Response, label, &response.content);
                return Some(response.content);
            }
            Err(e) => {
                tracing::warn!(label, error = %e, "llm call failed, retrying once");
            }
        }

        let mut retry_messages = request.messages.clone();
        retry_messages.push(ChatMessage::user(
            "Your previous response could not be used. Respond with a single valid JSON object only, no commentary, no code fences.",
        ));
        let retry_request = ChatRequest { messages: retry_messages, ..request };

        match self.llm.complete(retry_request).await {
            Ok(response) => {
                self.log_sink.write(ArtifactKind::Response, label, &response.content);
                Some(response.content)
            }
            Err(e) => {
                self.log_sink.write(ArtifactKind::Error, label, &e.to_string());
                tracing::warn!(label, error = %e, "llm call failed twice, skipping chunk");
                None
            }
        }
    }

    /// Parse a raw model response into an [`ExtractionResponse`]. A
    /// response that fails every repair stage is logged as a malformed
    /// artifact and treated as an empty extraction for this chunk, never as
    /// a run failure.
    fn parse_extraction(&self, raw: &str, label: &str) -> Option<ExtractionResponse> {
        match onemcp_llm::parse_llm_json::<ExtractionResponse>(raw) {
            ParseOutcome::Success(value) => Some(value),
            ParseOutcome::Partial { value, repairs } => {
                tracing::trace!(label, ?repairs, "extraction response needed repair");
                Some(value)
            }
            ParseOutcome::Failed { error, raw_excerpt } => {
                self.log_sink.write(ArtifactKind::MalformedResponse, label, &format!("{error}\n---\n{raw_excerpt}"));
                None
            }
        }
    }

    /// Persist one service's mapped graph: every node kind in dependency
    /// order, then every edge, each endpoint checked against the
    /// accumulated set of keys actually written so far.
    async fn persist_mapped_graph(&self, mapped: MappedGraph, valid_keys: &mut HashSet<String>, summary: &mut IndexingSummary) -> Result<()> {
        for kind in ["entity", "field", "operation", "example", "documentation"] {
            let bucket = dedup_by_key(mapped.nodes.iter().filter(|n| n.kind_name() == kind).cloned().collect());
            for node in bucket {
                if let GraphNode::Documentation(doc) = &node {
                    if !doc.is_valid() {
                        continue;
                    }
                }
                let key = node.key().to_string();
                count_node(summary, &node);
                self.driver.store_node(node).await?;
                valid_keys.insert(key);
            }
        }

        let edges = dedup_edges(mapped.edges);
        for edge in edges {
            if !valid_keys.contains(&edge.from_key) || !valid_keys.contains(&edge.to_key) {
                summary.edges_skipped += 1;
                continue;
            }
            match self.driver.store_edge(edge).await? {
                EdgeOutcome::Stored => summary.edges_written += 1,
                EdgeOutcome::SkippedMissingEndpoint => summary.edges_skipped += 1,
            }
        }

        Ok(())
    }

    /// Chunk every discovered Markdown doc, tag each chunk's entity mentions
    /// via the model, and persist the resulting `DocumentationNode`s and
    /// `MENTIONS` edges.
    async fn extract_documentation(
        &self,
        known_entities: &HashMap<String, String>,
        valid_keys: &mut HashSet<String>,
        summary: &mut IndexingSummary,
        cancel: &Cancellation,
    ) -> Result<()> {
        let doc_files = self.handbook.discover_doc_files().map_err(IndexerError::from)?;
        if doc_files.is_empty() || known_entities.is_empty() {
            return Ok(());
        }

        let chunker = MarkdownChunker::new();
        let entity_names: Vec<String> = known_entities.values().cloned().collect();
        let adaptive = self.config.markdown_adaptive();

        let mut corpus_tokens = 0usize;
        let mut contents = Vec::new();
        for path in &doc_files {
            let content = std::fs::read_to_string(path).map_err(IndexerError::from)?;
            corpus_tokens += content.len() / 4;
            contents.push((path.clone(), content));
        }

        for (path, content) in contents {
            if cancel.is_cancelled() {
                return Err(IndexerError::Cancelled);
            }
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("document").to_string();
            let params = markdown_chunk_params(&self.config, adaptive, corpus_tokens, known_entities.len());

            let chunks = chunker.chunk_with_params(&content, &file_name, params).await.map_err(IndexerError::Other)?;
            let mut mapped = MappedGraph::default();

            for chunk in &chunks {
                let label = format!("{file_name}#{}", chunk.chunk_index);
                let request = documentation_chunk_request(self.llm.model(), chunk, &entity_names);
                if let Some(response) = self.call_llm_with_retry(request, &label).await {
                    if let Some(parsed) = self.parse_extraction(&response, &label) {
                        let piece = map_extraction(&parsed, "documentation");
                        mapped.nodes.extend(piece.nodes);
                        mapped.edges.extend(piece.edges);
                    }
                }
            }

            self.persist_mapped_graph(mapped, valid_keys, summary).await?;
        }

        Ok(())
    }
}

/// Markdown chunking parameters for a corpus.
///
/// The adaptive path derives window/overlap from corpus shape (§4.1's
/// formula). The fixed path is driven by the configured
/// `windowSizeTokens`/`overlapTokens` keys rather than the corpus-shape
/// formula; `min_tokens` is kept proportional to the configured window so a
/// smaller configured window doesn't make every section "too big" to merge.
fn markdown_chunk_params(
    config: &HandbookConfig,
    adaptive: bool,
    corpus_tokens: usize,
    entity_count: usize,
) -> onemcp_chunking::AdaptiveParams {
    if adaptive {
        return onemcp_chunking::AdaptiveParams::compute(corpus_tokens, entity_count);
    }
    let max_tokens = config.markdown_window_size_tokens();
    onemcp_chunking::AdaptiveParams {
        min_tokens: (max_tokens * 3 / 10).max(100),
        max_tokens,
        overlap_tokens: config.markdown_overlap_tokens(),
    }
}

fn count_node(summary: &mut IndexingSummary, node: &GraphNode) {
    match node {
        GraphNode::Entity(_) => summary.entities += 1,
        GraphNode::Field(_) => summary.fields += 1,
        GraphNode::Operation(_) => summary.operations += 1,
        GraphNode::Example(_) => summary.examples += 1,
        GraphNode::Documentation(_) => summary.documentations += 1,
    }
}

/// Dedup nodes by key, keeping the first occurrence and its original order.
fn dedup_by_key(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if seen.insert(node.key().to_string()) {
            out.push(node);
        }
    }
    out
}

/// Dedup edges by `(fromKey, edgeType, toKey)`, keeping the first
/// occurrence. Edges synthesized from ownership fields are mapped before
/// the model's free-form `relationships` list, so a synthesized edge always
/// wins over a duplicate the model also emitted explicitly.
fn dedup_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(edges.len());
    for edge in edges {
        let triple = (edge.from_key.clone(), edge.edge_type.clone(), edge.to_key.clone());
        if seen.insert(triple) {
            out.push(edge);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use onemcp_core::HandbookLayout;
    use onemcp_graph::InMemoryGraphDriver;
    use onemcp_llm::{ChatResponse, Role};

    struct StubLlm {
        response: String,
    }

    #[async_trait]
    impl ChatCompletion for StubLlm {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, request: ChatRequest) -> onemcp_llm::Result<ChatResponse> {
            assert!(!request.messages.is_empty());
            assert_eq!(request.messages[0].role, Role::System);
            Ok(ChatResponse { content: self.response.clone(), model: "stub-model".to_string(), usage: None })
        }
    }

    fn write_handbook(dir: &std::path::Path) {
        std::fs::write(
            dir.join("Agent.yaml"),
            "name: acme\napis:\n  - name: sales\n    spec: sales.yaml\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.join("openapi")).unwrap();
        std::fs::write(
            dir.join("openapi").join("sales.yaml"),
            r#"
openapi: "3.0.0"
info:
  title: Sales API
  version: "1.0"
tags:
  - name: Sale
paths:
  /sales:
    get:
      operationId: listSales
      summary: List sales
      tags: [Sale]
      responses:
        "200":
          description: ok
"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn empty_handbook_indexes_successfully() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Agent.yaml"), "name: empty\napis: []\n").unwrap();
        let layout = HandbookLayout::discover(dir.path()).unwrap();

        let driver: Arc<dyn GraphDriver> = Arc::new(InMemoryGraphDriver::new());
        let llm: Arc<dyn ChatCompletion> = Arc::new(StubLlm { response: "{}".to_string() });
        let coordinator = IndexingCoordinator::new(
            layout,
            HandbookConfig::default(),
            driver,
            llm,
            Arc::new(onemcp_core::NullProgressSink),
            Arc::new(crate::log_sink::NullLogSink),
        );

        let summary = coordinator.index_handbook(&Cancellation::new()).await.unwrap();
        assert_eq!(summary.entities, 0);
        assert_eq!(coordinator.state(), IndexingState::Done);
    }

    #[tokio::test]
    async fn single_operation_api_is_extracted_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        write_handbook(dir.path());
        let layout = HandbookLayout::discover(dir.path()).unwrap();

        let response = serde_json::json!({
            "entities": [{"name": "Sale"}],
            "operations": [{
                "operationId": "listSales",
                "method": "GET",
                "path": "/sales",
                "category": "Retrieve",
                "primaryEntity": "Sale"
            }]
        })
        .to_string();

        let driver = Arc::new(InMemoryGraphDriver::new());
        let llm: Arc<dyn ChatCompletion> = Arc::new(StubLlm { response });
        let coordinator = IndexingCoordinator::new(
            layout,
            HandbookConfig::default(),
            driver.clone(),
            llm,
            Arc::new(onemcp_core::NullProgressSink),
            Arc::new(crate::log_sink::NullLogSink),
        );

        let summary = coordinator.index_handbook(&Cancellation::new()).await.unwrap();
        assert_eq!(summary.entities, 1);
        assert_eq!(summary.operations, 1);
        assert_eq!(summary.edges_written, 1);

        let incident = driver.query_by_entity("entity|sale").await.unwrap();
        assert_eq!(incident.nodes_for(onemcp_graph::edge_types::HAS_OPERATION).len(), 1);
    }

    #[test]
    fn dedup_by_key_keeps_first_occurrence() {
        let a = GraphNode::Entity(onemcp_graph::EntityNode { key: "entity|sale".into(), name: "Sale v1".into(), ..Default::default() });
        let b = GraphNode::Entity(onemcp_graph::EntityNode { key: "entity|sale".into(), name: "Sale v2".into(), ..Default::default() });
        let deduped = dedup_by_key(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].as_entity().unwrap().name, "Sale v1");
    }

    #[test]
    fn dedup_edges_keeps_first_triple() {
        let a = GraphEdge::new("entity|sale", "HAS_OPERATION", "op|listsales");
        let mut b = GraphEdge::new("entity|sale", "HAS_OPERATION", "op|listsales");
        b.description = Some("duplicate".to_string());
        let deduped = dedup_edges(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].description, None);
    }

    #[test]
    fn fixed_markdown_params_use_configured_window_and_overlap() {
        let config = HandbookConfig::parse(
            r#"
            [indexing.graph.chunking.markdown]
            adaptive = false
            windowSizeTokens = 200
            overlapTokens = 20
            "#,
            "test.toml",
        )
        .unwrap();

        let params = markdown_chunk_params(&config, false, 10_000, 5);
        assert_eq!(params.max_tokens, 200);
        assert_eq!(params.overlap_tokens, 20);
    }

    #[test]
    fn adaptive_markdown_params_ignore_fixed_window_keys() {
        let config = HandbookConfig::parse(
            r#"
            [indexing.graph.chunking.markdown]
            adaptive = true
            windowSizeTokens = 200
            overlapTokens = 20
            "#,
            "test.toml",
        )
        .unwrap();

        let adaptive_params = markdown_chunk_params(&config, true, 10_000, 5);
        let expected = onemcp_chunking::AdaptiveParams::compute(10_000, 5);
        assert_eq!(adaptive_params.max_tokens, expected.max_tokens);
        assert_eq!(adaptive_params.overlap_tokens, expected.overlap_tokens);
    }
}
