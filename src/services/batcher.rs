//! Splits a record sequence into fixed-size, order-preserving batches.

use crate::error::IngestError;
use crate::models::Record;

/// One upsert call's worth of records.
///
/// A batch is owned by exactly one dispatch task and dropped once its upsert
/// call returns.
#[derive(Debug)]
pub struct Batch {
    /// Position of this batch in the input order.
    pub index: usize,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partition `records` into batches of at most `batch_size` records.
///
/// Every input record lands in exactly one batch, batch order follows input
/// order, and all batches except possibly the last are full. An empty input
/// yields no batches.
pub fn split_into_batches(
    records: Vec<Record>,
    batch_size: usize,
) -> Result<Vec<Batch>, IngestError> {
    if batch_size == 0 {
        return Err(IngestError::InvalidBatchSize);
    }

    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut iter = records.into_iter();

    loop {
        let chunk: Vec<Record> = iter.by_ref().take(batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        batches.push(Batch {
            index: batches.len(),
            records: chunk,
        });
    }

    Ok(batches)
}
