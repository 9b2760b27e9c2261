//! Concurrent batch dispatch and outcome aggregation.
//!
//! Batches are fed to a fixed-size pool of worker tasks through a queue and
//! dispatched in input order; completion order is unspecified. The caller
//! gets a single report only after every batch has reported an outcome,
//! regardless of how many failed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, VectorStoreError};
use crate::models::Record;
use crate::services::batcher::{Batch, split_into_batches};
use crate::services::vector_store::VectorStore;

/// Outcome of one batch's upsert call.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_index: usize,
    pub records: usize,
    pub error: Option<VectorStoreError>,
}

/// One failed batch in the final report.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub records: usize,
    pub error: VectorStoreError,
}

/// Result of a whole ingestion run.
///
/// Produced only after the completion barrier releases; failures are ordered
/// by batch index and carry every failing batch, not just the first.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub batches_total: usize,
    pub records_total: usize,
    pub failures: Vec<BatchFailure>,
    pub elapsed: Duration,
}

impl IngestionReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn records_failed(&self) -> usize {
        self.failures.iter().map(|f| f.records).sum()
    }

    /// The lowest-indexed failure, when one representative error is enough.
    pub fn first_error(&self) -> Option<&VectorStoreError> {
        self.failures.first().map(|f| &f.error)
    }
}

type OutcomeCallback = dyn Fn(&BatchOutcome) + Send + Sync;

/// Pushes record batches into a vector store over a bounded worker pool.
pub struct IngestPipeline {
    store: Arc<dyn VectorStore>,
    max_concurrency: usize,
    on_batch_done: Option<Arc<OutcomeCallback>>,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn VectorStore>, max_concurrency: usize) -> Self {
        Self {
            store,
            max_concurrency: max_concurrency.max(1),
            on_batch_done: None,
        }
    }

    /// Register a callback invoked as each batch outcome arrives.
    #[must_use]
    pub fn on_batch_done<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchOutcome) + Send + Sync + 'static,
    {
        self.on_batch_done = Some(Arc::new(callback));
        self
    }

    /// Batch `records` and push them into `collection`.
    ///
    /// Fails synchronously on an empty record set or a zero batch size;
    /// store failures never fail this call, they land in the report.
    pub async fn ingest(
        &self,
        collection: &str,
        records: Vec<Record>,
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, IngestError> {
        if records.is_empty() {
            return Err(IngestError::NoRecords);
        }
        let batches = split_into_batches(records, batch_size)?;
        Ok(self.run_batches(collection, batches, cancel).await)
    }

    /// Dispatch batches to the worker pool and block until every batch has
    /// reported an outcome.
    pub async fn run_batches(
        &self,
        collection: &str,
        batches: Vec<Batch>,
        cancel: &CancellationToken,
    ) -> IngestionReport {
        let started = Instant::now();
        let batches_total = batches.len();
        let records_total: usize = batches.iter().map(Batch::len).sum();
        let batch_sizes: Vec<usize> = batches.iter().map(Batch::len).collect();

        if batches_total == 0 {
            return IngestionReport {
                batches_total,
                records_total,
                failures: Vec::new(),
                elapsed: started.elapsed(),
            };
        }

        // Queue and outcome buffer are both sized to the batch count, so
        // neither feeding the queue nor reporting an outcome can block.
        let (batch_tx, batch_rx) = mpsc::channel::<Batch>(batches_total);
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<BatchOutcome>(batches_total);

        for batch in batches {
            batch_tx
                .try_send(batch)
                .expect("batch queue sized to batch count");
        }
        drop(batch_tx);

        let workers = self.max_concurrency.min(batches_total);
        let batch_rx = Arc::new(Mutex::new(batch_rx));
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);

        for _ in 0..workers {
            let batch_rx = Arc::clone(&batch_rx);
            let outcome_tx = outcome_tx.clone();
            let store = Arc::clone(&self.store);
            let collection = collection.to_string();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let batch = { batch_rx.lock().await.recv().await };
                    let Some(batch) = batch else { break };
                    let outcome = dispatch(Arc::clone(&store), &collection, batch, &cancel).await;
                    if outcome_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(outcome_tx);

        // Completion barrier: the outcome channel only closes once every
        // worker has exited.
        let mut outcomes: Vec<BatchOutcome> = Vec::with_capacity(batches_total);
        while let Some(outcome) = outcome_rx.recv().await {
            if let Some(ref callback) = self.on_batch_done {
                callback(&outcome);
            }
            outcomes.push(outcome);
        }
        for handle in handles {
            let _ = handle.await;
        }

        let mut reported = vec![false; batches_total];
        let mut failures: Vec<BatchFailure> = Vec::new();
        for outcome in outcomes {
            if outcome.batch_index < batches_total {
                reported[outcome.batch_index] = true;
            }
            if let Some(error) = outcome.error {
                failures.push(BatchFailure {
                    batch_index: outcome.batch_index,
                    records: outcome.records,
                    error,
                });
            }
        }

        // A worker that died outside the guarded call loses its outcome;
        // surface the gap as a failure instead of hanging or under-reporting
        for (batch_index, seen) in reported.iter().enumerate() {
            if !seen {
                failures.push(BatchFailure {
                    batch_index,
                    records: batch_sizes[batch_index],
                    error: VectorStoreError::TaskFailure("batch outcome was lost".to_string()),
                });
            }
        }

        failures.sort_by_key(|f| f.batch_index);

        IngestionReport {
            batches_total,
            records_total,
            failures,
            elapsed: started.elapsed(),
        }
    }
}

/// Run one batch's upsert, converting a panicking backend into an error
/// outcome so the barrier always sees exactly one outcome per batch.
async fn dispatch(
    store: Arc<dyn VectorStore>,
    collection: &str,
    batch: Batch,
    cancel: &CancellationToken,
) -> BatchOutcome {
    let batch_index = batch.index;
    let records = batch.len();

    if cancel.is_cancelled() {
        return BatchOutcome {
            batch_index,
            records,
            error: Some(VectorStoreError::Cancelled),
        };
    }

    let collection = collection.to_string();
    let cancel = cancel.clone();
    let call =
        tokio::spawn(async move { store.upsert_batch(&collection, batch.records, &cancel).await });

    let error = match call.await {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(error),
        Err(join_error) => Some(VectorStoreError::TaskFailure(join_error.to_string())),
    };

    BatchOutcome {
        batch_index,
        records,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_store::CollectionInfo;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockStore {
        fail_ids: HashSet<u64>,
        panic_ids: HashSet<u64>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        stored_ids: StdMutex<Vec<u64>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl VectorStore for MockStore {
        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            Ok(true)
        }

        async fn collection_info(
            &self,
            _collection: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(None)
        }

        async fn create_collection(
            &self,
            _collection: &str,
            _dimension: u64,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn delete_collection(&self, _collection: &str) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert_batch(
            &self,
            _collection: &str,
            records: Vec<Record>,
            _cancel: &CancellationToken,
        ) -> Result<(), VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let result = if records.iter().any(|r| self.panic_ids.contains(&r.id)) {
                panic!("backend exploded");
            } else if records.iter().any(|r| self.fail_ids.contains(&r.id)) {
                Err(VectorStoreError::Upsert("write rejected".to_string()))
            } else {
                self.stored_ids
                    .lock()
                    .unwrap()
                    .extend(records.iter().map(|r| r.id));
                Ok(())
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn records(n: u64) -> Vec<Record> {
        (0..n).map(|id| Record::new(id, vec![0.1, 0.2])).collect()
    }

    fn pipeline(store: Arc<MockStore>, max_concurrency: usize) -> IngestPipeline {
        IngestPipeline::new(store, max_concurrency)
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let store = Arc::new(MockStore::default());
        let result = pipeline(store, 4)
            .ingest("articles", Vec::new(), 100, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(IngestError::NoRecords)));
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let store = Arc::new(MockStore::default());
        let result = pipeline(store, 4)
            .ingest("articles", records(10), 0, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(IngestError::InvalidBatchSize)));
    }

    #[tokio::test]
    async fn all_batches_succeed() {
        let store = Arc::new(MockStore::default());
        let report = pipeline(store.clone(), 4)
            .ingest("articles", records(1000), 100, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.batches_total, 10);
        assert_eq!(report.records_total, 1000);
        assert!(report.failures.is_empty());
        assert!(report.first_error().is_none());
        assert_eq!(store.calls.load(Ordering::SeqCst), 10);

        let mut stored = store.stored_ids.lock().unwrap().clone();
        stored.sort_unstable();
        assert_eq!(stored, (0..1000).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn single_failing_batch_is_reported() {
        // Record 350 lands in batch 3 of 10
        let store = Arc::new(MockStore {
            fail_ids: HashSet::from([350]),
            ..Default::default()
        });
        let report = pipeline(store.clone(), 4)
            .ingest("articles", records(1000), 100, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].batch_index, 3);
        assert_eq!(report.failures[0].records, 100);
        assert_eq!(report.records_failed(), 100);
        assert!(matches!(
            report.first_error(),
            Some(VectorStoreError::Upsert(_))
        ));
        // Sibling batches still ran to completion
        assert_eq!(store.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn multiple_failures_are_listed_in_batch_order() {
        let store = Arc::new(MockStore {
            fail_ids: HashSet::from([150, 750]),
            ..Default::default()
        });
        let report = pipeline(store, 4)
            .ingest("articles", records(1000), 100, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.succeeded());
        let indexes: Vec<usize> = report.failures.iter().map(|f| f.batch_index).collect();
        assert_eq!(indexes, vec![1, 7]);
        assert!(matches!(
            report.first_error(),
            Some(VectorStoreError::Upsert(_))
        ));
    }

    #[tokio::test]
    async fn zero_batches_complete_immediately() {
        let store = Arc::new(MockStore::default());
        let report = pipeline(store.clone(), 4)
            .run_batches("articles", Vec::new(), &CancellationToken::new())
            .await;

        assert!(report.succeeded());
        assert_eq!(report.batches_total, 0);
        assert_eq!(report.records_total, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_backend_becomes_batch_failure() {
        let store = Arc::new(MockStore {
            panic_ids: HashSet::from([250]),
            ..Default::default()
        });
        let report = pipeline(store.clone(), 4)
            .ingest("articles", records(1000), 100, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].batch_index, 2);
        assert!(matches!(
            report.failures[0].error,
            VectorStoreError::TaskFailure(_)
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn in_flight_calls_never_exceed_the_bound() {
        let store = Arc::new(MockStore {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let report = pipeline(store.clone(), 3)
            .ingest("articles", records(20), 1, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.batches_total, 20);
        let max = store.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "observed {} concurrent upserts", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn batches_are_dispatched_in_input_order() {
        let store = Arc::new(MockStore::default());
        let report = pipeline(store.clone(), 1)
            .ingest("articles", records(9), 2, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.batches_total, 5);
        // One worker pulls from a FIFO queue: arrival order == input order
        let stored = store.stored_ids.lock().unwrap().clone();
        assert_eq!(stored, (0..9).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_store() {
        let store = Arc::new(MockStore::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = pipeline(store.clone(), 4)
            .ingest("articles", records(100), 10, &cancel)
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failures.len(), 10);
        assert!(
            report
                .failures
                .iter()
                .all(|f| matches!(f.error, VectorStoreError::Cancelled))
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_sees_every_outcome() {
        let store = Arc::new(MockStore {
            fail_ids: HashSet::from([5]),
            ..Default::default()
        });
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_callback = Arc::clone(&seen);

        let report = pipeline(store, 4)
            .on_batch_done(move |_outcome| {
                seen_in_callback.fetch_add(1, Ordering::SeqCst);
            })
            .ingest("articles", records(30), 10, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.batches_total, 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
