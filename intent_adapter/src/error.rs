//! Error types for the intent adapter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Invalid regex pattern for entity '{entity}': {source}")]
    InvalidPattern {
        entity: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AdapterError>;
