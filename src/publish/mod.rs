//! Publishing resources to the store.
//!
//! [`Publisher`] is the one path every resource takes into the store:
//! inline content is chunked directly, pinned files are pinned first and a
//! `{link, type}` pointer record is chunked in their place.

pub mod bundle;
mod uploader;

pub use bundle::BundlePublisher;
pub use uploader::{ChunkUploader, Publication, PublicationOutcome};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::asset::StorageStrategy;
use crate::error::PublishError;
use crate::{debug, log};
use crate::pinning::{self, Pinner};
use crate::report::{PartialUpload, PublicationReport};

/// Chunk content type of pointer records.
pub const POINTER_CONTENT_TYPE: &str = "ipfs";

/// What happens to the run when a resource's chunk loop stops early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the partial upload and move on to the next resource.
    #[default]
    Continue,
    /// Record the partial upload and fail the run.
    Abort,
}

/// Pointer stored in place of a pinned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerRecord {
    pub link: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl PointerRecord {
    pub fn to_json(&self) -> String {
        // Two string fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct Publisher {
    uploader: ChunkUploader,
    pinner: Arc<dyn Pinner>,
    gateway: String,
    policy: FailurePolicy,
}

impl Publisher {
    pub fn new(
        uploader: ChunkUploader,
        pinner: Arc<dyn Pinner>,
        gateway: impl Into<String>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            uploader,
            pinner,
            gateway: gateway.into(),
            policy,
        }
    }

    /// Chunk `content` under `resource_path`.
    ///
    /// Returns whether every chunk was confirmed. A partial upload is
    /// recorded in `report` and only becomes an error under
    /// [`FailurePolicy::Abort`].
    pub async fn inline(
        &self,
        resource_path: &str,
        content: &str,
        content_type: &str,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        let publication = self
            .uploader
            .publish(resource_path, content, content_type)
            .await?;
        self.settle(publication, report)
    }

    /// Pin `file` and chunk its pointer record under `resource_path`.
    ///
    /// Pinning failures always propagate.
    pub async fn pinned(
        &self,
        resource_path: &str,
        file: &Path,
        content_type: &str,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        let pinned = self
            .pinner
            .pin(file)
            .await
            .map_err(|source| PublishError::PinningFailed {
                path: file.to_path_buf(),
                source,
            })?;
        report.record_pin(pinned.size);
        log!("pin"; "{} -> {}", file.display(), pinned.cid);

        let pointer = PointerRecord {
            link: pinning::gateway_link(&self.gateway, &pinned.cid),
            content_type: content_type.to_string(),
        };
        self.inline(resource_path, &pointer.to_json(), POINTER_CONTENT_TYPE, report)
            .await
    }

    /// Publish `file` under `resource_path` the way `strategy` says.
    pub async fn file(
        &self,
        strategy: StorageStrategy,
        resource_path: &str,
        file: &Path,
        content_type: &str,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        match strategy {
            StorageStrategy::Inline => {
                let content = tokio::fs::read_to_string(file)
                    .await
                    .map_err(|e| PublishError::io(file, e))?;
                self.inline(resource_path, &content, content_type, report)
                    .await
            }
            StorageStrategy::Pinned => {
                self.pinned(resource_path, file, content_type, report)
                    .await
            }
        }
    }

    fn settle(
        &self,
        publication: Publication,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        let Publication {
            path,
            outcome,
            report: own,
        } = publication;
        report.merge(own);

        match outcome {
            PublicationOutcome::Complete { chunks } => {
                debug!("publish"; "{} complete ({} chunk(s))", path, chunks);
                Ok(true)
            }
            PublicationOutcome::PartialFailure {
                last_confirmed,
                total,
                error,
            } => {
                report.record_partial(PartialUpload {
                    path: path.clone(),
                    last_confirmed,
                    total,
                    error: error.to_string(),
                });
                match self.policy {
                    FailurePolicy::Continue => Ok(false),
                    FailurePolicy::Abort => Err(PublishError::ChunkUploadFailed {
                        path,
                        index: last_confirmed.map_or(0, |i| i + 1),
                        total,
                        source: error,
                    }),
                }
            }
        }
    }
}
