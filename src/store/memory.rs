//! In-memory resource store.
//!
//! Backs `--dry-run` and the test suite. Every submission is appended to a
//! log in arrival order and slotted by `(path, index)`, so callers can check
//! both what was sent and what a reader would reassemble.

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use super::{ResourceStore, StoreError};
use crate::codec::{self, Chunk};

#[derive(Default)]
struct State {
    /// `(path, index)` in submission order.
    log: Vec<(String, usize)>,
    /// Chunks per resource path, keyed by index.
    resources: FxHashMap<String, BTreeMap<usize, Chunk>>,
    /// Submissions that should be refused.
    failures: FxHashSet<(String, usize)>,
}

/// A resource store that lives in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the submission of `index` for `path`.
    #[cfg(test)]
    pub fn fail_at(&self, path: &str, index: usize) {
        self.state.lock().failures.insert((path.to_string(), index));
    }

    /// Every `(path, index)` submission that succeeded, in order.
    #[cfg(test)]
    pub fn submissions(&self) -> Vec<(String, usize)> {
        self.state.lock().log.clone()
    }

    /// Stored chunks for `path` in index order.
    pub fn chunks(&self, path: &str) -> Vec<Chunk> {
        self.state
            .lock()
            .resources
            .get(path)
            .map(|chunks| chunks.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Reassemble the stored content of `path`.
    pub fn read(&self, path: &str) -> Option<String> {
        let chunks = self.chunks(path);
        if chunks.is_empty() {
            return None;
        }
        codec::decode_all(chunks.iter().map(|c| c.payload.as_str())).ok()
    }

    /// All resource paths with at least one stored chunk, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.state.lock().resources.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn set_chunk(&self, chunk: &Chunk) -> Result<String, StoreError> {
        let mut state = self.state.lock();
        let key = (chunk.resource_path.clone(), chunk.index);
        if state.failures.contains(&key) {
            return Err(StoreError::Rejected(format!(
                "chunk {} of {} refused",
                chunk.index, chunk.resource_path
            )));
        }

        let sequence = state.log.len();
        state.log.push(key);
        state
            .resources
            .entry(chunk.resource_path.clone())
            .or_default()
            .insert(chunk.index, chunk.clone());

        let digest = blake3::hash(format!("{sequence}:{}", chunk.payload).as_bytes());
        Ok(format!("0x{}", digest.to_hex()))
    }

    fn describe(&self) -> String {
        format!("in-memory store ({} resource(s))", self.paths().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::chunk_resource;

    #[tokio::test]
    async fn test_store_and_read_back() {
        let store = MemoryStore::new();
        for chunk in chunk_resource("/", "hello world", "text/html", 4).unwrap() {
            store.set_chunk(&chunk).await.unwrap();
        }
        assert_eq!(store.read("/").as_deref(), Some("hello world"));
        assert_eq!(store.chunks("/").len(), 3);
        assert_eq!(store.paths(), vec!["/".to_string()]);
        assert!(store.read("/missing").is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_at("/a", 1);
        let chunks = chunk_resource("/a", "abcdef", "text/plain", 3).unwrap();

        assert!(store.set_chunk(&chunks[0]).await.is_ok());
        assert!(matches!(
            store.set_chunk(&chunks[1]).await,
            Err(StoreError::Rejected(_))
        ));
        assert_eq!(store.submissions(), vec![("/a".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_transaction_hashes_differ() {
        let store = MemoryStore::new();
        let chunks = chunk_resource("/a", "aaaa", "text/plain", 2).unwrap();
        let first = store.set_chunk(&chunks[0]).await.unwrap();
        let second = store.set_chunk(&chunks[1]).await.unwrap();
        assert!(first.starts_with("0x"));
        assert_ne!(first, second);
    }
}
