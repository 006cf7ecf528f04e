//! Handbook manifest and on-disk layout.
//!
//! ```text
//! <handbook_root>/
//!   Agent.yaml                    # handbook manifest (APIs, guardrails, releases)
//!   instructions.md               # free-form instructions document
//!   openapi/*.yaml|*.yml          # one file per API
//!   docs/**/*.{md,markdown,mdx,txt}
//!   regression-suite/**           # opaque to the core
//! ```
//!
//! `Agent.yaml` is the only required file. Everything else is discovered
//! relative to it, and files outside these locations are ignored: in
//! particular `regression-suite/**` is never walked, no matter what it
//! contains.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const MANIFEST_FILE: &str = "Agent.yaml";
const INSTRUCTIONS_FILE: &str = "instructions.md";
const OPENAPI_DIR: &str = "openapi";
const DOCS_DIR: &str = "docs";
const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "txt"];

/// One entry in the manifest's `apis` list: the OpenAPI file (relative to
/// `openapi/`) this handbook declares, plus whatever guardrail/release
/// metadata the manifest attaches to it. The core only reads `spec`; the
/// rest passes through untouched for anything downstream that wants it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEntry {
    pub name: String,
    pub spec: PathBuf,
    #[serde(default)]
    pub guardrails: serde_yaml::Value,
    #[serde(default)]
    pub release: serde_yaml::Value,
}

/// The parsed contents of `Agent.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandbookManifest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub apis: Vec<ApiEntry>,
}

impl HandbookManifest {
    /// Parse a manifest from YAML (or JSON, which is a YAML subset).
    pub fn parse(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| CoreError::ConfigMissing(format!("invalid handbook manifest: {e}")))
    }

    /// Load and parse the manifest at `manifest_path`.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(manifest_path)?;
        Self::parse(&contents)
    }
}

/// The resolved, on-disk layout of a handbook: a manifest plus the absolute
/// paths of every api spec and doc file it declares.
#[derive(Debug, Clone)]
pub struct HandbookLayout {
    pub root: PathBuf,
    pub manifest: HandbookManifest,
}

impl HandbookLayout {
    /// Discover a handbook rooted at `root`, reading `root/Agent.yaml` as its
    /// manifest.
    pub fn discover(root: &Path) -> Result<Self> {
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(CoreError::ConfigMissing(format!("no {MANIFEST_FILE} found under {}", root.display())));
        }
        let manifest = HandbookManifest::load(&manifest_path)?;
        Ok(Self { root: root.to_path_buf(), manifest })
    }

    /// Absolute path to a declared api's OpenAPI spec, bound under
    /// `<root>/openapi/`. `apis[].spec` names a file within that directory;
    /// the manifest never points outside it.
    #[must_use]
    pub fn api_spec_path(&self, api: &ApiEntry) -> PathBuf {
        self.root.join(OPENAPI_DIR).join(&api.spec)
    }

    /// Absolute path to the free-form instructions document. May not exist;
    /// the instructions document is optional context, not a requirement.
    #[must_use]
    pub fn instructions_path(&self) -> PathBuf {
        self.root.join(INSTRUCTIONS_FILE)
    }

    /// Read `instructions.md` if present, returning `None` when the
    /// handbook doesn't carry one.
    pub fn read_instructions(&self) -> Result<Option<String>> {
        let path = self.instructions_path();
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    /// Absolute path to the handbook's documentation directory.
    #[must_use]
    pub fn docs_dir_path(&self) -> PathBuf {
        self.root.join(DOCS_DIR)
    }

    /// Every doc file under `docs/`, walked recursively, with a recognized
    /// extension (`md`, `markdown`, `mdx`, `txt`), sorted for deterministic
    /// processing order. A missing `docs/` directory yields an empty list:
    /// documentation is optional. `regression-suite/**` is never under
    /// `docs/`, so it is never visited by this walk regardless of content.
    pub fn discover_doc_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.docs_dir_path();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        walk_doc_files(&dir, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn walk_doc_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_doc_files(&path, out)?;
        } else if file_type.is_file() && has_doc_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_doc_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| DOC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_minimal_manifest() {
        let manifest = HandbookManifest::parse(
            r#"
name: acme-commerce
apis:
  - name: orders
    spec: orders.yaml
"#,
        )
        .unwrap();
        assert_eq!(manifest.name, "acme-commerce");
        assert_eq!(manifest.apis.len(), 1);
        assert_eq!(manifest.apis[0].spec, PathBuf::from("orders.yaml"));
    }

    #[test]
    fn empty_apis_list_is_valid() {
        let manifest = HandbookManifest::parse("name: acme\napis: []\n").unwrap();
        assert!(manifest.apis.is_empty());
    }

    #[test]
    fn discover_reads_manifest_and_walks_docs_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Agent.yaml"), "name: acme\napis: []\n").unwrap();
        std::fs::create_dir_all(dir.path().join("docs").join("guides")).unwrap();
        let mut f1 = std::fs::File::create(dir.path().join("docs").join("b.md")).unwrap();
        writeln!(f1, "# B").unwrap();
        let mut f2 = std::fs::File::create(dir.path().join("docs").join("guides").join("a.mdx")).unwrap();
        writeln!(f2, "# A").unwrap();
        std::fs::write(dir.path().join("docs").join("ignored.png"), b"\x89PNG").unwrap();

        let layout = HandbookLayout::discover(dir.path()).unwrap();
        let docs = layout.discover_doc_files().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|p| p.ends_with("b.md")));
        assert!(docs.iter().any(|p| p.ends_with(Path::new("guides").join("a.mdx"))));
    }

    #[test]
    fn regression_suite_is_never_walked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Agent.yaml"), "name: acme\napis: []\n").unwrap();
        std::fs::create_dir_all(dir.path().join("regression-suite")).unwrap();
        std::fs::write(dir.path().join("regression-suite").join("case.md"), "not a doc").unwrap();

        let layout = HandbookLayout::discover(dir.path()).unwrap();
        assert!(layout.discover_doc_files().unwrap().is_empty());
    }

    #[test]
    fn instructions_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Agent.yaml"), "name: acme\napis: []\n").unwrap();
        let layout = HandbookLayout::discover(dir.path()).unwrap();
        assert_eq!(layout.read_instructions().unwrap(), None);

        std::fs::write(dir.path().join("instructions.md"), "Be nice.").unwrap();
        assert_eq!(layout.read_instructions().unwrap(), Some("Be nice.".to_string()));
    }

    #[test]
    fn missing_manifest_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = HandbookLayout::discover(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissing(_)));
    }
}
