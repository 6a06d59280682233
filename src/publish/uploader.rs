//! Chunk uploader: publish one resource as an ordered chunk sequence.

use std::sync::Arc;

use crate::codec::{self, CodecError};
use crate::logger::ChunkProgress;
use crate::report::PublicationReport;
use crate::store::{StoreError, SubmissionQueue};
use crate::{debug, log};

/// How one resource's chunk loop ended.
#[derive(Debug)]
pub enum PublicationOutcome {
    /// Every chunk `0..chunks` was confirmed.
    Complete { chunks: usize },
    /// The loop stopped at the first unconfirmed chunk; later chunks were
    /// never submitted.
    PartialFailure {
        last_confirmed: Option<usize>,
        total: usize,
        error: StoreError,
    },
}

impl PublicationOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Result of one `publish` call: the outcome plus its own accounting.
#[derive(Debug)]
pub struct Publication {
    pub path: String,
    pub outcome: PublicationOutcome,
    pub report: PublicationReport,
}

/// Publishes resources through a shared [`SubmissionQueue`].
#[derive(Clone)]
pub struct ChunkUploader {
    queue: Arc<SubmissionQueue>,
    chunk_size: usize,
}

impl ChunkUploader {
    pub fn new(queue: Arc<SubmissionQueue>, chunk_size: usize) -> Self {
        Self { queue, chunk_size }
    }

    /// Publish `content` under `resource_path`.
    ///
    /// Chunk `i + 1` is submitted only after chunk `i` is confirmed. The
    /// first failure ends the loop for this resource only; it is reported in
    /// the outcome, never raised.
    pub async fn publish(
        &self,
        resource_path: &str,
        content: &str,
        content_type: &str,
    ) -> Result<Publication, CodecError> {
        let chunks = codec::chunk_resource(resource_path, content, content_type, self.chunk_size)?;
        let total = chunks.len();
        let mut report = PublicationReport::new();

        if total == 0 {
            debug!("upload"; "{}: empty content, nothing to send", resource_path);
            return Ok(Publication {
                path: resource_path.to_string(),
                outcome: PublicationOutcome::Complete { chunks: 0 },
                report,
            });
        }

        debug!("upload"; "{}: {} chunk(s) of {}", resource_path, total, content_type);
        let progress = ChunkProgress::new(resource_path, total);
        let mut last_confirmed = None;

        for chunk in &chunks {
            match self.queue.submit(chunk).await {
                Ok(receipt) => {
                    debug!("upload"; "{} chunk {}/{} confirmed (#{}, {})",
                        receipt.resource_path, receipt.index + 1, total,
                        receipt.sequence, receipt.transaction_hash);
                    report.record_chunk(chunk.raw_len);
                    last_confirmed = Some(chunk.index);
                    progress.inc();
                }
                Err(error) => {
                    drop(progress);
                    log!("error"; "{}: chunk {}/{} failed: {}",
                        resource_path, chunk.index + 1, total, error);
                    return Ok(Publication {
                        path: resource_path.to_string(),
                        outcome: PublicationOutcome::PartialFailure {
                            last_confirmed,
                            total,
                            error,
                        },
                        report,
                    });
                }
            }
        }

        progress.finish();
        report.record_resource();
        Ok(Publication {
            path: resource_path.to_string(),
            outcome: PublicationOutcome::Complete { chunks: total },
            report,
        })
    }
}
