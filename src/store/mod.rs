//! Resource store clients.
//!
//! The store is a write-once, append-style remote service addressed by
//! resource path. It is consumed as a black box with a single write
//! operation: submit one chunk and wait until it is confirmed.
//!
//! | Module   | Purpose                                         |
//! |----------|-------------------------------------------------|
//! | `http`   | Relay client (`POST <endpoint>/chunks`)         |
//! | `memory` | In-memory store for dry runs and tests          |
//! | `queue`  | Single-flight submission queue                  |

mod http;
mod memory;
mod queue;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use queue::{SubmissionQueue, UploadReceipt};

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::Chunk;

/// Failures while submitting a chunk. Each one means "no receipt".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed")]
    Http(#[from] reqwest::Error),

    #[error("store rejected the chunk: {0}")]
    Rejected(String),

    #[error("store returned an unexpected response: {0}")]
    InvalidResponse(String),
}

/// A service that durably holds chunked content addressed by path.
///
/// `set_chunk` returns only after the submission is confirmed (the
/// transaction is final); the returned string is its transaction hash.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn set_chunk(&self, chunk: &Chunk) -> Result<String, StoreError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
