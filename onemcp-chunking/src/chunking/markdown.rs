//! Heading-aware Markdown chunking.
//!
//! Walks a document's heading tree, packs paragraphs into chunks bounded by
//! an adaptive token budget, keeps fenced code blocks whole, and falls back
//! to sentence-boundary splitting only when a single paragraph or code fence
//! alone exceeds the budget.

use super::strategies::{ChunkingConfig, ChunkingStrategy, DocumentChunk, SlidingWindowChunker};
use super::tokenizer::TokenCounter;

/// Adaptive chunk-size parameters derived from corpus shape.
///
/// Larger handbooks, and handbooks with more distinct entities to describe,
/// get smaller chunks so that each one stays focused on a single topic; very
/// small handbooks get larger chunks so that related sections aren't
/// needlessly fragmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveParams {
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl AdaptiveParams {
    /// Derive chunk-size parameters from the corpus's total token count and
    /// the number of entities the extraction pass expects to describe.
    ///
    /// The base target comes from total doc tokens (700 below 50k, 500 up to
    /// 200k, 350 above); an entity count above 10 shrinks that target 5% per
    /// 10 entities past the first 10, capped at a 50% reduction. The result
    /// is clamped to `[200, 800]`. `min_tokens` is `max(100, 0.3 * target)`
    /// and `overlap_tokens` is `min(100, 0.12 * target)`.
    #[must_use]
    pub fn compute(corpus_tokens: usize, entity_count: usize) -> Self {
        let base_target: f64 = if corpus_tokens < 50_000 {
            700.0
        } else if corpus_tokens <= 200_000 {
            500.0
        } else {
            350.0
        };

        let entity_steps = entity_count.saturating_sub(10) / 10;
        let shrink_fraction = (entity_steps as f64 * 0.05).min(0.5);
        let target = base_target * (1.0 - shrink_fraction);
        let target = target.clamp(200.0, 800.0);

        let max_tokens = target.round() as usize;
        let min_tokens = (100.0_f64.max(0.3 * target)).round() as usize;
        let overlap_tokens = (100.0_f64.min(0.12 * target)).round() as usize;

        Self { min_tokens, max_tokens, overlap_tokens }
    }

    #[must_use]
    pub fn to_chunking_config(self) -> ChunkingConfig {
        ChunkingConfig {
            max_tokens: self.max_tokens,
            overlap_tokens: self.overlap_tokens,
            min_tokens: self.min_tokens,
            respect_sentences: true,
            respect_paragraphs: true,
        }
    }
}

/// One heading-delimited section of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    heading_path: Vec<String>,
    body: String,
    byte_offset: usize,
}

fn is_fence_delimiter(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn heading_level(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = trimmed[level..].trim_start();
    if rest.is_empty() && trimmed.len() == level {
        return None;
    }
    Some((level, rest))
}

/// Split a document into heading-delimited sections, tracking each
/// section's full heading path (e.g. `["Orders API", "Authentication"]`) and
/// its byte offset in the original document. Lines inside a fenced code
/// block are never mistaken for headings.
fn split_into_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading_stack: Vec<(usize, String)> = Vec::new();
    let mut current_body = String::new();
    let mut current_offset = 0usize;
    let mut in_fence = false;
    let mut byte_pos = 0usize;

    let flush = |heading_stack: &[(usize, String)], body: &str, offset: usize, out: &mut Vec<Section>| {
        if !body.trim().is_empty() {
            out.push(Section {
                heading_path: heading_stack.iter().map(|(_, h)| h.clone()).collect(),
                body: body.to_string(),
                byte_offset: offset,
            });
        }
    };

    for line in content.split_inclusive('\n') {
        let line_no_newline = line.strip_suffix('\n').unwrap_or(line);

        if is_fence_delimiter(line_no_newline) {
            in_fence = !in_fence;
            current_body.push_str(line);
            byte_pos += line.len();
            continue;
        }

        if !in_fence {
            if let Some((level, title)) = heading_level(line_no_newline) {
                flush(&heading_stack, &current_body, current_offset, &mut sections);
                current_body.clear();

                while heading_stack.last().is_some_and(|(l, _)| *l >= level) {
                    heading_stack.pop();
                }
                heading_stack.push((level, title.trim().to_string()));
                current_offset = byte_pos + line.len();
                byte_pos += line.len();
                continue;
            }
        }

        current_body.push_str(line);
        byte_pos += line.len();
    }

    flush(&heading_stack, &current_body, current_offset, &mut sections);
    sections
}

/// Split a section body into paragraphs, treating a fenced code block as one
/// atomic paragraph regardless of the blank lines inside it.
fn split_into_paragraphs(body: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_fence = false;

    for line in body.lines() {
        if is_fence_delimiter(line) {
            in_fence = !in_fence;
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            if !in_fence {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }

        if in_fence {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.trim().is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Chunks a Markdown document along its heading structure.
pub struct MarkdownChunker {
    tokenizer: Option<Box<dyn TokenCounter>>,
}

impl std::fmt::Debug for MarkdownChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownChunker").field("has_tokenizer", &self.tokenizer.is_some()).finish()
    }
}

impl Default for MarkdownChunker {
    fn default() -> Self {
        Self { tokenizer: None }
    }
}

impl MarkdownChunker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn TokenCounter>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    fn estimate_tokens(&self, text: &str) -> usize {
        self.tokenizer.as_ref().map_or_else(|| text.len() / 4, |t| t.count_tokens(text))
    }

    /// Coalesce a section that's too small to stand on its own with the
    /// sibling that follows it, for as long as the previous section is
    /// still under `min_tokens` and the combined body still fits under
    /// `max_tokens`. Keeps the smaller (earlier) section's heading path,
    /// since that's the section the merge is rescuing from fragmentation.
    fn merge_undersized_sections(&self, sections: Vec<Section>, params: &AdaptiveParams) -> Vec<Section> {
        let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
        for section in sections {
            if let Some(last) = merged.last_mut() {
                let last_tokens = self.estimate_tokens(&last.body);
                if last_tokens < params.min_tokens {
                    let combined_tokens = last_tokens + self.estimate_tokens(&section.body);
                    if combined_tokens <= params.max_tokens {
                        last.body.push_str("\n\n");
                        last.body.push_str(&section.body);
                        continue;
                    }
                }
            }
            merged.push(section);
        }
        merged
    }

    /// Chunk `content` (read from `file_name`) using parameters derived from
    /// `corpus_tokens` (the total token count across every doc in the
    /// handbook, not just this file) and `entity_count` via
    /// [`AdaptiveParams::compute`].
    ///
    /// # Errors
    /// Propagates errors from the sentence-boundary fallback splitter.
    pub async fn chunk_adaptive(
        &self,
        content: &str,
        file_name: &str,
        corpus_tokens: usize,
        entity_count: usize,
    ) -> anyhow::Result<Vec<DocumentChunk>> {
        let params = AdaptiveParams::compute(corpus_tokens, entity_count);
        self.chunk_with_params(content, file_name, params).await
    }

    /// Chunk `content` (read from `file_name`) with explicit parameters.
    ///
    /// # Errors
    /// Propagates errors from the sentence-boundary fallback splitter.
    pub async fn chunk_with_params(&self, content: &str, file_name: &str, params: AdaptiveParams) -> anyhow::Result<Vec<DocumentChunk>> {
        let sections = self.merge_undersized_sections(split_into_sections(content), &params);
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;

        for section in sections {
            let paragraphs = split_into_paragraphs(&section.body);
            let mut pending = String::new();
            let mut pending_offset = section.byte_offset;

            let flush_pending = |pending: &str, offset: usize, chunk_index: &mut usize, chunks: &mut Vec<DocumentChunk>, heading_path: &[String]| {
                if pending.trim().is_empty() {
                    return;
                }
                let token_count = self.estimate_tokens(pending);
                let oversize = token_count > params.max_tokens;
                chunks.push(
                    DocumentChunk::new(pending.to_string(), offset, token_count, *chunk_index)
                        .with_heading_path(heading_path.to_vec())
                        .with_file_name(file_name)
                        .with_oversize(oversize),
                );
                *chunk_index += 1;
            };

            for paragraph in paragraphs {
                let paragraph_tokens = self.estimate_tokens(&paragraph);
                let pending_tokens = self.estimate_tokens(&pending);

                if paragraph_tokens > params.max_tokens {
                    // A single paragraph (or code fence) is larger than the
                    // budget on its own; flush what's pending, then fall
                    // back to sentence-boundary splitting for this one.
                    flush_pending(&pending, pending_offset, &mut chunk_index, &mut chunks, &section.heading_path);
                    pending.clear();

                    let fallback = SlidingWindowChunker::new().chunk(&paragraph, &params.to_chunking_config()).await?;
                    for mut sub in fallback {
                        sub.chunk_index = chunk_index;
                        sub.heading_path = section.heading_path.clone();
                        sub.file_name = file_name.to_string();
                        sub.oversize = sub.token_count > params.max_tokens;
                        chunks.push(sub);
                        chunk_index += 1;
                    }
                    pending_offset = section.byte_offset;
                    continue;
                }

                if pending_tokens + paragraph_tokens > params.max_tokens && pending_tokens >= params.min_tokens {
                    flush_pending(&pending, pending_offset, &mut chunk_index, &mut chunks, &section.heading_path);
                    pending = carry_overlap(&pending, params.overlap_tokens);
                    pending_offset = section.byte_offset;
                }

                if !pending.is_empty() {
                    pending.push_str("\n\n");
                }
                pending.push_str(&paragraph);
            }

            flush_pending(&pending, pending_offset, &mut chunk_index, &mut chunks, &section.heading_path);
        }

        Ok(chunks)
    }
}

/// Keep a trailing slice of `text` worth roughly `overlap_tokens` tokens
/// (character-count heuristic, no tokenizer dependency needed here since
/// it only needs to be approximately right) to seed the next chunk.
fn carry_overlap(text: &str, overlap_tokens: usize) -> String {
    let overlap_chars = overlap_tokens * 4;
    if text.len() <= overlap_chars {
        return String::new();
    }
    let start = text.len() - overlap_chars;
    let mut boundary = start;
    while boundary < text.len() && !text.is_char_boundary(boundary) {
        boundary += 1;
    }
    text[boundary..].to_string()
}
