//! Pipeline error types.
//!
//! Unresolvable asset references are not errors: the resolver returns
//! `None` and the literal is left alone. Chunk failures surface as a
//! [`PublicationOutcome`](crate::publish::PublicationOutcome) instead of an
//! error so the caller decides whether the run continues.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::pinning::PinError;
use crate::store::StoreError;

/// Fatal (or caller-escalated) failures of the publishing pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to publish `{path}`: chunk {index} of {total} was not confirmed")]
    ChunkUploadFailed {
        path: String,
        index: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    #[error("failed to pin `{}`", .path.display())]
    PinningFailed {
        path: PathBuf,
        #[source]
        source: PinError,
    },

    #[error("IO error on `{}`", .0.display())]
    FileIo(PathBuf, #[source] std::io::Error),

    #[error("stage `{stage}` failed")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("no network selected (pass --network or set [network] name)")]
    MissingNetwork,

    #[error("no resource store address (pass --address or enable the deploy stage)")]
    MissingAddress,

    #[error("`{0}` is not a valid store address")]
    InvalidAddress(String),

    #[error("entry document `{}` not found", .0.display())]
    MissingEntry(PathBuf),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl PublishError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::FileIo(path.into(), err)
    }
}
