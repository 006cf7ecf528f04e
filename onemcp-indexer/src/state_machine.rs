//! The indexing coordinator's per-handbook state machine.
//!
//! One `IndexingStateMachine` instance drives a single `indexHandbook` run.
//! Unlike a long-lived agent's lifecycle, a handbook index only ever moves
//! forward (or drops into `Failed`); there is no pause/resume/recover loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{IndexerError, Result};

/// Coarse phases of one `indexHandbook` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexingState {
    Idle,
    Initializing,
    LoadingServices,
    /// Chunked or whole-spec extraction for every OpenAPI service, merged.
    ExtractingOperations,
    ValidatingDedupWrite,
    ExtractingDocumentation,
    EnsuringGraphExists,
    Done,
    Failed,
}

impl IndexingState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::LoadingServices => "loading-services",
            Self::ExtractingOperations => "extracting-operations",
            Self::ValidatingDedupWrite => "validate-dedup-write",
            Self::ExtractingDocumentation => "documents-extraction",
            Self::EnsuringGraphExists => "ensure-graph-exists",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    const fn can_transition_to(self, target: Self) -> bool {
        use IndexingState::{
            Done, EnsuringGraphExists, ExtractingDocumentation, ExtractingOperations, Failed, Idle, Initializing,
            LoadingServices, ValidatingDedupWrite,
        };
        matches!(
            (self, target),
            (Idle, Initializing | Failed)
                | (Initializing, LoadingServices | Failed)
                | (LoadingServices, ExtractingOperations | Failed)
                | (ExtractingOperations, ValidatingDedupWrite | Failed)
                | (ValidatingDedupWrite, ExtractingDocumentation | Failed)
                | (ExtractingDocumentation, EnsuringGraphExists | Failed)
                | (EnsuringGraphExists, Done | Failed)
        )
    }
}

#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: IndexingState,
    pub to: IndexingState,
    pub at: Instant,
    pub reason: Option<String>,
}

/// Drives `IndexingState` forward for one handbook run, recording a
/// transition history for diagnostics.
pub struct IndexingStateMachine {
    handbook: String,
    current: Mutex<IndexingState>,
    history: Mutex<Vec<StateTransition>>,
}

impl IndexingStateMachine {
    #[must_use]
    pub fn new(handbook: impl Into<String>) -> Self {
        Self { handbook: handbook.into(), current: Mutex::new(IndexingState::Idle), history: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn current(&self) -> IndexingState {
        *self.current.lock()
    }

    pub fn history(&self) -> Vec<StateTransition> {
        self.history.lock().clone()
    }

    /// Move to `target`, recording the transition. Fails if the transition
    /// isn't in the allowed matrix; the caller should treat that as a
    /// `state-invariant` bug, not a recoverable condition.
    pub fn transition_to(&self, target: IndexingState, reason: Option<&str>) -> Result<()> {
        let current = self.current();
        if !current.can_transition_to(target) {
            return Err(IndexerError::InvalidTransition { from: current.label(), to: target.label() });
        }

        if current == target {
            return Ok(());
        }

        info!(handbook = %self.handbook, from = current.label(), to = target.label(), reason, "indexing state transition");
        *self.current.lock() = target;
        self.history.lock().push(StateTransition { from: current, to: target, at: Instant::now(), reason: reason.map(str::to_string) });
        Ok(())
    }

    /// Force the machine into `Failed` from any non-terminal state, logging
    /// `reason`. Never itself fails: a failure to record failure shouldn't
    /// mask the original error.
    pub fn fail(&self, reason: &str) {
        let current = self.current();
        if matches!(current, IndexingState::Done | IndexingState::Failed) {
            return;
        }
        warn!(handbook = %self.handbook, from = current.label(), reason, "indexing run failed");
        *self.current.lock() = IndexingState::Failed;
        self.history.lock().push(StateTransition {
            from: current,
            to: IndexingState::Failed,
            at: Instant::now(),
            reason: Some(reason.to_string()),
        });
    }

    #[must_use]
    pub fn elapsed_in_state(&self) -> Duration {
        self.history.lock().last().map_or(Duration::ZERO, |t| t.at.elapsed())
    }
}

/// Per-run counters the coordinator accumulates across services, reported
/// at `done`/`failed` and surfaced to the progress sink.
#[derive(Debug, Clone, Default)]
pub struct IndexingSummary {
    pub entities: usize,
    pub fields: usize,
    pub operations: usize,
    pub examples: usize,
    pub documentations: usize,
    pub edges_written: usize,
    pub edges_skipped: usize,
    pub services_fallen_back: Vec<String>,
}

impl IndexingSummary {
    #[must_use]
    pub fn merge(mut self, other: &Self) -> Self {
        self.entities += other.entities;
        self.fields += other.fields;
        self.operations += other.operations;
        self.examples += other.examples;
        self.documentations += other.documentations;
        self.edges_written += other.edges_written;
        self.edges_skipped += other.edges_skipped;
        self.services_fallen_back.extend(other.services_fallen_back.iter().cloned());
        self
    }
}

/// Shared, cheaply-cloned handle to a running coordinator's live counters,
/// so progress reporting can read them without locking the whole summary.
pub type SharedCounters = Arc<Mutex<HashMap<&'static str, usize>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions_follow_the_happy_path() {
        let sm = IndexingStateMachine::new("acme");
        sm.transition_to(IndexingState::Initializing, None).unwrap();
        sm.transition_to(IndexingState::LoadingServices, None).unwrap();
        sm.transition_to(IndexingState::ExtractingOperations, None).unwrap();
        sm.transition_to(IndexingState::ValidatingDedupWrite, None).unwrap();
        sm.transition_to(IndexingState::ExtractingDocumentation, None).unwrap();
        sm.transition_to(IndexingState::EnsuringGraphExists, None).unwrap();
        sm.transition_to(IndexingState::Done, None).unwrap();
        assert_eq!(sm.current(), IndexingState::Done);
        assert_eq!(sm.history().len(), 7);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let sm = IndexingStateMachine::new("acme");
        sm.transition_to(IndexingState::Initializing, None).unwrap();
        let err = sm.transition_to(IndexingState::Done, None).unwrap_err();
        assert!(matches!(err, IndexerError::InvalidTransition { .. }));
    }

    #[test]
    fn fail_is_reachable_from_any_non_terminal_state() {
        let sm = IndexingStateMachine::new("acme");
        sm.transition_to(IndexingState::Initializing, None).unwrap();
        sm.fail("driver unreachable");
        assert_eq!(sm.current(), IndexingState::Failed);
    }

    #[test]
    fn summary_merge_sums_every_counter() {
        let a = IndexingSummary { entities: 1, edges_written: 2, ..Default::default() };
        let b = IndexingSummary { entities: 3, edges_skipped: 1, ..Default::default() };
        let merged = a.merge(&b);
        assert_eq!(merged.entities, 4);
        assert_eq!(merged.edges_written, 2);
        assert_eq!(merged.edges_skipped, 1);
    }
}
