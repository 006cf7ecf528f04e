//! Error types for OpenAPI parsing and chunking.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpenApiError>;

#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("could not parse OpenAPI document as YAML or JSON: {0}")]
    Parse(String),

    #[error("could not serialize operation chunk: {0}")]
    Serialize(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
