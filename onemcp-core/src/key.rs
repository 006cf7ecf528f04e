//! Node key construction and canonicalization.
//!
//! The logical key is always `<kind>|<slug>`. Backends whose identifier
//! grammar disallows `|` canonicalize on write; the logical key inside the
//! system never changes shape.

use std::fmt;

/// The five node kinds that share the `<kind>|<slug>` key grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Entity,
    Field,
    Operation,
    Example,
    Doc,
}

impl NodeKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Field => "field",
            Self::Operation => "op",
            Self::Example => "example",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Lower-case `input`, replacing any character outside `[a-z0-9_-]` with `_`.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}

/// Build a logical key `<kind>|<slug>` from a display name.
#[must_use]
pub fn make_key(kind: NodeKind, name: &str) -> String {
    format!("{}|{}", kind.prefix(), slugify(name))
}

/// Build a logical key for a child node scoped to a parent, `<kind>|<parent_slug>_<name_slug>`.
///
/// Used when the extractor omits a key for fields and examples, whose keys are
/// synthesized from `<parent_key>_<name>` per the data model.
#[must_use]
pub fn make_scoped_key(kind: NodeKind, parent_key: &str, name: &str) -> String {
    let parent_slug = parent_key.rsplit('|').next().unwrap_or(parent_key);
    format!("{}|{}_{}", kind.prefix(), slugify(parent_slug), slugify(name))
}

/// Canonicalize a logical key for a backend whose identifier grammar
/// disallows `|`. Idempotent: canonicalizing twice yields the same string.
#[must_use]
pub fn canonicalize_for_backend(key: &str) -> String {
    key.replace('|', "_")
}

/// Canonicalize an edge identifier of the form `<fromKey>/<edgeType>/<toKey>`
/// (used internally to dedup triples) for a backend that also disallows `<>`.
#[must_use]
pub fn canonicalize_edge_id(from_key: &str, edge_type: &str, to_key: &str) -> String {
    let raw = format!("{from_key}<{edge_type}>{to_key}");
    canonicalize_for_backend(&raw).replace("<>", "_to_").replace(['<', '>'], "_to_")
}
