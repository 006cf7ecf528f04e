//! Per-run artifact logging (C10).
//!
//! Every prompt sent to the model, every raw response it returned, and every
//! unparseable response are written to disk as their own file, one file per
//! artifact per run. Names are disambiguated by a timestamp plus a random
//! suffix rather than by content, so two concurrent chunk extractions never
//! collide and nothing needs to be locked.

use std::path::{Path, PathBuf};

use tracing::warn;

/// What kind of artifact a [`LogSink`] call is recording, used only to pick
/// a readable filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Prompt,
    Response,
    MalformedResponse,
    GraphSummary,
    Error,
}

impl ArtifactKind {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Response => "response",
            Self::MalformedResponse => "malformed",
            Self::GraphSummary => "graph-summary",
            Self::Error => "error",
        }
    }
}

/// Receives per-run artifacts. Failures to log are never allowed to fail an
/// indexing run; implementations should log the failure themselves via
/// `tracing` and return.
pub trait LogSink: Send + Sync {
    fn write(&self, kind: ArtifactKind, label: &str, content: &str);
}

/// Writes each artifact to its own file under `<run_dir>/<artifact-kind>/`.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    run_dir: PathBuf,
}

impl FileLogSink {
    /// Artifacts for this run are written under `root/<handbook>-<run_id>/`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>, handbook: &str, run_id: &str) -> Self {
        Self { run_dir: root.as_ref().join(format!("{handbook}-{run_id}")) }
    }

    fn artifact_path(&self, kind: ArtifactKind, label: &str) -> PathBuf {
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let disambiguator = uuid::Uuid::new_v4().simple().to_string();
        let safe_label = sanitize_label(label);
        self.run_dir.join(format!("{}-{safe_label}-{timestamp}-{}.log", kind.prefix(), &disambiguator[..8]))
    }
}

impl LogSink for FileLogSink {
    fn write(&self, kind: ArtifactKind, label: &str, content: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.run_dir) {
            warn!(error = %e, dir = %self.run_dir.display(), "failed to create log sink directory");
            return;
        }
        let path = self.artifact_path(kind, label);
        if let Err(e) = std::fs::write(&path, content) {
            warn!(error = %e, path = %path.display(), "failed to write log artifact");
        }
    }
}

/// A sink that discards everything, for tests and for callers that don't
/// want artifacts kept on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn write(&self, _kind: ArtifactKind, _label: &str, _content: &str) {}
}

fn sanitize_label(label: &str) -> String {
    label.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect()
}
