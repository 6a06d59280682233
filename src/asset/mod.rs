//! Asset resolution and storage strategy.

mod resolve;
mod strategy;

pub use resolve::{AssetResolver, DEFAULT_ASSET_DIRS, ResolvedAsset};
pub use strategy::{AssetRole, StorageStrategy, StrategySelector};
