//! Handbook configuration loading and process-wide logging setup.

mod config;
mod error;
mod logging;

pub use config::HandbookConfig;
pub use error::{ConfigError, Result};
pub use logging::{init_logging, LogFormat};
