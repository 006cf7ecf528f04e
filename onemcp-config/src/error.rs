//! Error type for configuration loading.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("invalid TOML in {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
}
