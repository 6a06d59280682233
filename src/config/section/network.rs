//! `[network]` and `[report]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [network]
//! name = "polygon_mainnet"      # Overridden by --network
//!
//! [report]
//! path = "deploy-report.json"   # Relative to the project root
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network the store is deployed to; mapped to a short chain alias.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: "deploy-report.json".into(),
        }
    }
}
