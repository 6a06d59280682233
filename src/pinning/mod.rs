//! Content-pinning clients.
//!
//! Binary assets are not stored in the resource store verbatim. They are
//! pinned to a content-addressed service and only a small pointer record
//! referencing the returned identifier is chunked into the store.

mod hash;
mod pinata;

pub use hash::HashPinner;
pub use pinata::PinataClient;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("pinning request failed")]
    Http(#[from] reqwest::Error),

    #[error("pinning service rejected the upload: {0}")]
    Rejected(String),

    #[error("pinning service returned an unexpected response: {0}")]
    InvalidResponse(String),
}

/// A pinned file: its content identifier and the bytes sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedFile {
    pub cid: String,
    pub size: u64,
}

/// A service that stores whole files and returns a stable identifier.
#[async_trait]
pub trait Pinner: Send + Sync {
    /// Read `path` and pin it whole. Never retried internally.
    async fn pin(&self, path: &Path) -> Result<PinnedFile, PinError>;
}

/// Retrieval URL for `cid` under a gateway prefix such as `https://gw/ipfs`.
pub fn gateway_link(gateway: &str, cid: &str) -> String {
    format!("{}/{}", gateway.trim_end_matches('/'), cid)
}

/// Pinner that answers every request with the same identifier.
#[cfg(test)]
pub struct StaticPinner(pub &'static str);

#[cfg(test)]
#[async_trait]
impl Pinner for StaticPinner {
    async fn pin(&self, path: &Path) -> Result<PinnedFile, PinError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| PinError::Io(path.to_path_buf(), e))?
            .len();
        Ok(PinnedFile {
            cid: self.0.to_string(),
            size,
        })
    }
}

/// Pinner that always fails, for error-propagation tests.
#[cfg(test)]
pub struct FailingPinner;

#[cfg(test)]
#[async_trait]
impl Pinner for FailingPinner {
    async fn pin(&self, _path: &Path) -> Result<PinnedFile, PinError> {
        Err(PinError::Rejected("401 unauthorized".into()))
    }
}
