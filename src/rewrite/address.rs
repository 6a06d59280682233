//! `wttp://` address grammar.
//!
//! ```text
//! <scheme>://<storeAddress>/<path>[/?chain=<alias>]
//! ```
//!
//! Resource paths are flat: separators are forward slashes and every
//! parent-directory segment is replaced by the `parent-dir` marker.

use std::path::{Component, Path};

pub const DEFAULT_SCHEME: &str = "wttp";

/// Stand-in for a `..` segment inside a resource path.
pub const PARENT_DIR_MARKER: &str = "parent-dir";

/// Alias used when a network name is not in the table.
pub const UNKNOWN_NETWORK: &str = "unknown";

/// Short alias for a network name (case-insensitive).
pub fn network_alias(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "ethereum_mainnet" => "eth",
        "polygon_mainnet" => "poly",
        "arbitrum" => "arb",
        "blast" => "blast",
        "mantle" => "mantle",
        "optimism" => "optimism",
        "zksync" => "zk",
        "base" => "base",
        _ => UNKNOWN_NETWORK,
    }
}

/// Flatten a relative path into the store's path form.
///
/// `..\assets\logo.png` and `../assets/logo.png` both become
/// `parent-dir/assets/logo.png`; `.` segments are dropped.
pub fn normalize_resource_path(relative: &Path) -> String {
    // Backslashes are separators regardless of host platform.
    let unified = relative.to_string_lossy().replace('\\', "/");

    Path::new(&unified)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some(PARENT_DIR_MARKER.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `address` looks like a deployed store address (`0x` + 40 hex).
pub fn is_store_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Builds addresses for one store on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBuilder {
    scheme: String,
    store: String,
    alias: Option<&'static str>,
}

impl AddressBuilder {
    pub fn new(scheme: &str, store: &str, network: Option<&str>) -> Self {
        Self {
            scheme: scheme.to_string(),
            store: store.to_string(),
            alias: network.map(network_alias),
        }
    }

    /// Store resource path for a normalized path: `logo.png` → `/logo.png`.
    pub fn resource_path(normalized: &str) -> String {
        format!("/{}", normalized.trim_start_matches('/'))
    }

    /// Address without the chain suffix, as used in the entry document's
    /// bundle tags.
    pub fn bare_url(&self, normalized: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.store, normalized.trim_start_matches('/'))
    }

    /// Full address for a normalized path.
    pub fn url(&self, normalized: &str) -> String {
        let path = normalized.trim_start_matches('/');
        match self.alias {
            Some(alias) => format!("{}/?chain={}", self.bare_url(path), alias),
            None => self.bare_url(path),
        }
    }
}
