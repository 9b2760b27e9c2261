mod config;
mod record;

pub use config::{
    Config, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_DIMENSION, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_QDRANT_URL, IngestConfig, OutputConfig, OutputFormat, StoreConfig,
};
pub use record::{Record, parse_records, validate_records};
