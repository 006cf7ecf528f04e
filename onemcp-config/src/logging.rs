//! Tracing setup for the indexer and retrieval binaries.
//!
//! Mirrors the donor workspace's pattern of an `EnvFilter` driven by
//! `RUST_LOG` (falling back to a sensible default) layered with a `fmt`
//! subscriber. Callers that want JSON output (for shipping logs to an
//! aggregator) can ask for it explicitly; humans running a handbook index
//! locally get the default human-readable layer.

use tracing_subscriber::{fmt, EnvFilter};

/// Output format for the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global tracing subscriber. Safe to call once per process;
/// a second call is a silent no-op rather than a panic, since tests in
/// several crates may each try to initialize logging independently.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(true).try_init(),
        LogFormat::Json => fmt().with_env_filter(filter).with_target(true).json().try_init(),
    };

    if let Err(err) = result {
        // Subscriber already installed (e.g. by another crate's test harness).
        tracing::trace!("tracing subscriber already initialized: {err}");
    }
}
