mod batcher;
mod pipeline;
mod vector_store;

pub use batcher::{Batch, split_into_batches};
pub use pipeline::{BatchFailure, BatchOutcome, IngestPipeline, IngestionReport};
pub use vector_store::{CollectionInfo, QdrantBackend, VectorStore, create_backend};
