//! Progress reporting shared by the indexer and the retrieval service.
//!
//! A [`ProgressSink`] receives [`ProgressEvent`]s describing one named unit of
//! work (a handbook load, a chunk extraction pass, a graph write). Emission is
//! rate-limited by the sink itself, not the caller: callers report as often as
//! they like, and the sink decides what actually reaches its transport.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a unit of work, matching the wire vocabulary the
/// retrieval and indexing front ends both speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ProgressStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A single progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: String,
    pub label: String,
    pub completed: u64,
    pub total: u64,
    pub message: Option<String>,
    pub attrs: serde_json::Value,
    pub status: ProgressStatus,
}

impl ProgressEvent {
    #[must_use]
    pub fn running(id: impl Into<String>, label: impl Into<String>, completed: u64, total: u64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            completed,
            total,
            message: None,
            attrs: serde_json::Value::Null,
            status: ProgressStatus::Running,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: serde_json::Value) -> Self {
        self.attrs = attrs;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        self.status = status;
        self
    }
}

/// Receives progress events. Implementations decide presentation; the
/// indexing coordinator only knows it can report as often as it wants.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A sink that does nothing. Used when no caller is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _event: ProgressEvent) {}
}

/// Wraps an inner sink and only forwards an event when at least one of:
/// a minimum time interval has elapsed since the last emitted event for this
/// `id`, the completed count has moved by at least `min_delta`, or the event
/// carries a terminal status. Terminal events always pass through.
pub struct RateLimitedSink<S> {
    inner: S,
    min_interval: Duration,
    min_delta: u64,
    last: Mutex<std::collections::HashMap<String, (Instant, u64)>>,
}

impl<S: ProgressSink> RateLimitedSink<S> {
    #[must_use]
    pub fn new(inner: S, min_interval: Duration, min_delta: u64) -> Self {
        Self { inner, min_interval, min_delta, last: Mutex::new(std::collections::HashMap::new()) }
    }

    fn should_emit(&self, event: &ProgressEvent) -> bool {
        if event.status.is_terminal() {
            return true;
        }
        let mut last = self.last.lock();
        match last.get(&event.id) {
            None => true,
            Some((at, completed)) => {
                at.elapsed() >= self.min_interval
                    || event.completed.saturating_sub(*completed) >= self.min_delta
            }
        }
    }
}

impl<S: ProgressSink> ProgressSink for RateLimitedSink<S> {
    fn report(&self, event: ProgressEvent) {
        if self.should_emit(&event) {
            self.last.lock().insert(event.id.clone(), (Instant::now(), event.completed));
            self.inner.report(event);
        }
    }
}

/// Fans a single event out to every sink in the list.
pub struct BroadcastSink {
    sinks: Vec<Box<dyn ProgressSink>>,
}

impl BroadcastSink {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for BroadcastSink {
    fn report(&self, event: ProgressEvent) {
        for sink in &self.sinks {
            sink.report(event.clone());
        }
    }
}

/// Emits each event as a `tracing` event at info level, the sink used when no
/// richer UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&self, event: ProgressEvent) {
        tracing::info!(
            id = %event.id,
            label = %event.label,
            completed = event.completed,
            total = event.total,
            status = ?event.status,
            message = event.message.as_deref().unwrap_or(""),
            "progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressSink for CollectingSink {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().push(event);
        }
    }

    #[test]
    fn terminal_events_always_pass_through() {
        let collector = Arc::new(CollectingSink::default());
        let rate_limited = RateLimitedSink::new(CollectingSinkRef(collector.clone()), Duration::from_secs(60), 1000);

        rate_limited.report(ProgressEvent::running("job-1", "load", 0, 10));
        rate_limited.report(
            ProgressEvent::running("job-1", "load", 10, 10).with_status(ProgressStatus::Completed),
        );

        assert_eq!(collector.events.lock().len(), 2);
    }

    #[test]
    fn intermediate_events_are_throttled_until_delta_met() {
        let collector = Arc::new(CollectingSink::default());
        let rate_limited = RateLimitedSink::new(CollectingSinkRef(collector.clone()), Duration::from_secs(60), 5);

        rate_limited.report(ProgressEvent::running("job-1", "load", 0, 100));
        rate_limited.report(ProgressEvent::running("job-1", "load", 2, 100));
        rate_limited.report(ProgressEvent::running("job-1", "load", 6, 100));

        assert_eq!(collector.events.lock().len(), 2);
    }

    struct CollectingSinkRef(Arc<CollectingSink>);

    impl ProgressSink for CollectingSinkRef {
        fn report(&self, event: ProgressEvent) {
            self.0.report(event);
        }
    }
}
