//! Publication report.
//!
//! An explicit accumulator: each publish call fills its own report, the
//! orchestrator merges them and persists the final value once per run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A resource whose chunk loop stopped before the last chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialUpload {
    pub path: String,
    /// Highest confirmed index, `None` if not even chunk 0 landed.
    pub last_confirmed: Option<usize>,
    pub total: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationReport {
    pub store_address: Option<String>,
    pub network: Option<String>,
    /// Files sent to the pinning service.
    pub pinned_files: usize,
    /// Total bytes sent to the pinning service.
    pub pinned_bytes: u64,
    /// Resources whose every chunk was confirmed.
    pub resources: usize,
    pub chunks_sent: usize,
    /// Raw (pre-encoding) bytes carried by confirmed chunks.
    pub bytes_sent: u64,
    pub rewritten_files: Vec<String>,
    pub partial_uploads: Vec<PartialUpload>,
}

impl PublicationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pin(&mut self, size: u64) {
        self.pinned_files += 1;
        self.pinned_bytes += size;
    }

    pub fn record_chunk(&mut self, raw_len: usize) {
        self.chunks_sent += 1;
        self.bytes_sent += raw_len as u64;
    }

    pub fn record_resource(&mut self) {
        self.resources += 1;
    }

    pub fn record_partial(&mut self, partial: PartialUpload) {
        self.partial_uploads.push(partial);
    }

    pub fn record_rewrite(&mut self, file: impl Into<String>) {
        self.rewritten_files.push(file.into());
    }

    /// Fold another report's counters into this one.
    ///
    /// Identity fields (`store_address`, `network`) are taken from `other`
    /// only when this report has none.
    pub fn merge(&mut self, other: PublicationReport) {
        if self.store_address.is_none() {
            self.store_address = other.store_address;
        }
        if self.network.is_none() {
            self.network = other.network;
        }
        self.pinned_files += other.pinned_files;
        self.pinned_bytes += other.pinned_bytes;
        self.resources += other.resources;
        self.chunks_sent += other.chunks_sent;
        self.bytes_sent += other.bytes_sent;
        self.rewritten_files.extend(other.rewritten_files);
        self.partial_uploads.extend(other.partial_uploads);
    }

    pub fn is_complete(&self) -> bool {
        self.partial_uploads.is_empty()
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create `{}`", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report `{}`", path.display()))
    }
}
