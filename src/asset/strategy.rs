//! Storage strategy selection.

use serde::Serialize;

use super::ResolvedAsset;

/// How an asset's bytes reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStrategy {
    /// Content is chunked under the asset's own resource path.
    Inline,
    /// Content is pinned; a `{link, type}` pointer is chunked in its place.
    Pinned,
}

/// Where an asset comes from in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    /// Literal found in a source file.
    Referenced,
    /// The build's `index.html`.
    EntryDocument,
    /// Primary style or script bundle emitted by the build.
    Bundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySelector {
    inline_bundles: bool,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self { inline_bundles: true }
    }
}

impl StrategySelector {
    pub fn new(inline_bundles: bool) -> Self {
        Self { inline_bundles }
    }

    /// Strategy for an asset referenced from source.
    pub fn select(&self, _asset: &ResolvedAsset) -> StorageStrategy {
        self.select_role(AssetRole::Referenced)
    }

    pub fn select_role(&self, role: AssetRole) -> StorageStrategy {
        match role {
            AssetRole::Referenced => StorageStrategy::Pinned,
            AssetRole::EntryDocument => StorageStrategy::Inline,
            AssetRole::Bundle if self.inline_bundles => StorageStrategy::Inline,
            AssetRole::Bundle => StorageStrategy::Pinned,
        }
    }
}
