//! Error types for the vector loader.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors detected before any batch is dispatched.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("no records to ingest")]
    NoRecords,
}

/// Errors returned by a vector store backend.
#[derive(Debug, Error, Clone)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    Connection(String),

    #[error("collection error: {0}")]
    Collection(String),

    #[error("upsert error: {0}")]
    Upsert(String),

    #[error("delete error: {0}")]
    Delete(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("batch task failed: {0}")]
    TaskFailure(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection errors are always retryable
            VectorStoreError::Connection(_) => true,
            // Other store errors might be transient
            VectorStoreError::Collection(msg)
            | VectorStoreError::Upsert(msg)
            | VectorStoreError::Delete(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
            VectorStoreError::Cancelled | VectorStoreError::TaskFailure(_) => false,
        }
    }
}

/// Errors related to reading and validating input records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("duplicate record id: {0}")]
    DuplicateId(u64),

    #[error("record {id} has a {actual}-dimensional vector, expected {expected}")]
    DimensionMismatch { id: u64, expected: usize, actual: usize },

    #[error("record {0} has an empty vector")]
    EmptyVector(u64),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    Path(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("{0}")]
    Other(String),
}
