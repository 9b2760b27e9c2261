//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use super::{CollectionInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{Record, StoreConfig};
use crate::utils::retry::{RetryPolicy, retry};

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    retry: RetryPolicy,
}

impl QdrantBackend {
    /// Create a new Qdrant backend from configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(config.max_attempts),
        })
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::Connection(e.to_string()))
    }

    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        match self.client.collection_info(collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            })),
            Err(e) => {
                let msg = e.to_string();
                if is_not_found(&msg) {
                    Ok(None)
                } else {
                    Err(VectorStoreError::Collection(msg))
                }
            }
        }
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> Result<(), VectorStoreError> {
        if self.collection_info(collection).await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(collection)
            .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        match self.client.delete_collection(collection).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                // Dropping an absent collection counts as success
                if is_not_found(&msg) {
                    Ok(())
                } else {
                    Err(VectorStoreError::Delete(msg))
                }
            }
        }
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records.into_iter().map(record_to_point).collect();

        // Re-sending the same points is safe: upsert is idempotent per id
        retry(&self.retry, || {
            let request = UpsertPointsBuilder::new(collection, points.clone());
            async move {
                if cancel.is_cancelled() {
                    return Err(VectorStoreError::Cancelled);
                }
                tokio::select! {
                    _ = cancel.cancelled() => Err(VectorStoreError::Cancelled),
                    result = self.client.upsert_points(request) => result
                        .map(|_| ())
                        .map_err(|e| VectorStoreError::Upsert(e.to_string())),
                }
            }
        })
        .await
    }
}

fn is_not_found(msg: &str) -> bool {
    msg.contains("not found") || msg.contains("doesn't exist")
}

fn record_to_point(record: Record) -> PointStruct {
    let payload: HashMap<String, qdrant_client::qdrant::Value> = record
        .payload
        .into_iter()
        .map(|(key, value)| (key, json_to_value(value)))
        .collect();

    PointStruct::new(record.id, record.vector, payload)
}

fn json_to_value(value: serde_json::Value) -> qdrant_client::qdrant::Value {
    use qdrant_client::qdrant::{ListValue, Struct, Value, value::Kind};

    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or(0.0)),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        }),
    };

    Value { kind: Some(kind) }
}
