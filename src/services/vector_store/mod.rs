//! Vector store abstraction layer.
//!
//! The pipeline only needs one capability from a store: an idempotent batch
//! upsert. The remaining methods are one-off setup and status glue used by
//! the CLI, not by the pipeline itself.

mod qdrant;

pub use qdrant::QdrantBackend;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::VectorStoreError;
use crate::models::{Record, StoreConfig};

/// Collection information.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Capability contract a vector store backend must provide.
///
/// `upsert_batch` must be idempotent per record id: re-sending an id with a
/// new vector or payload overwrites, never duplicates. That property is what
/// makes retrying a failed batch safe. Each call either fully applies its
/// batch or returns an error; callers never assume partial application.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Get information about a collection. Returns None if it doesn't exist.
    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create a collection if it doesn't exist.
    async fn create_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> Result<(), VectorStoreError>;

    /// Delete a collection. Deleting a collection that doesn't exist is not
    /// an error.
    async fn delete_collection(&self, collection: &str) -> Result<(), VectorStoreError>;

    /// Insert or update a batch of records, keyed by record id.
    ///
    /// The token is checked between retry attempts and while a call is in
    /// flight; a cancelled upsert returns [`VectorStoreError::Cancelled`].
    async fn upsert_batch(
        &self,
        collection: &str,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> Result<(), VectorStoreError>;
}

/// Create a vector store backend from configuration.
pub fn create_backend(config: &StoreConfig) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    let backend = QdrantBackend::new(config)?;
    Ok(Box::new(backend))
}
