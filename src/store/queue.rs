//! Single-flight submission queue.
//!
//! Every chunk submission is a state-mutating transaction signed by one
//! publishing identity, and the store enforces a strict per-submitter
//! sequence number. Two submissions in flight at once would race for the
//! same slot. The queue holds an async gate across each submission so at
//! most one request is outstanding, no matter how many callers share it.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::{ResourceStore, StoreError};
use crate::codec::Chunk;

/// Confirmation for one submitted chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Position of this submission in the queue's confirmed sequence.
    pub sequence: u64,
    pub resource_path: String,
    pub index: usize,
    pub transaction_hash: String,
}

/// Serializes submissions to a [`ResourceStore`].
pub struct SubmissionQueue {
    store: Arc<dyn ResourceStore>,
    /// Next sequence number; the lock doubles as the in-flight gate.
    next: Mutex<u64>,
}

impl SubmissionQueue {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            next: Mutex::new(0),
        }
    }

    /// Submit one chunk and wait for its confirmation.
    ///
    /// The sequence number is only consumed by a confirmed submission.
    pub async fn submit(&self, chunk: &Chunk) -> Result<UploadReceipt, StoreError> {
        let mut next = self.next.lock().await;
        let transaction_hash = self.store.set_chunk(chunk).await?;

        let sequence = *next;
        *next += 1;

        Ok(UploadReceipt {
            sequence,
            resource_path: chunk.resource_path.clone(),
            index: chunk.index,
            transaction_hash,
        })
    }

    /// Number of confirmed submissions so far.
    #[cfg(test)]
    pub async fn confirmed(&self) -> u64 {
        *self.next.lock().await
    }
}
