//! `[stages]` section configuration.
//!
//! External commands run by `wttp deploy`. Every stage is optional; an
//! empty command skips it.
//!
//! # Example
//!
//! ```toml
//! [stages.clean]
//! command = ["npx", "hardhat", "clean"]
//!
//! [stages.compile]
//! command = ["npx", "hardhat", "compile"]
//!
//! [stages.deploy]
//! command = ["npx", "hardhat", "run", "scripts/deploy.js", "--network", "$WTTP_NETWORK"]
//!
//! [stages.build]
//! command = ["npx", "react-scripts", "build"]
//! quiet = false
//! ```
//!
//! Arguments may use `$WTTP_ROOT`, `$WTTP_NETWORK`, `$WTTP_ADDRESS`,
//! `$WTTP_SOURCE_DIR` and `$WTTP_BUILD_DIR`.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Package runners that may fetch the real tool on first use.
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx", "yarn", "pnpm", "dlx"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub clean: StageConfig,
    pub compile: StageConfig,
    pub deploy: StageConfig,
    pub build: StageConfig,
}

impl StagesConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        self.clean.validate(FieldPath::new("stages.clean.command"), diag);
        self.compile.validate(FieldPath::new("stages.compile.command"), diag);
        self.deploy.validate(FieldPath::new("stages.deploy.command"), diag);
        self.build.validate(FieldPath::new("stages.build.command"), diag);
    }
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Command and arguments. Supports `$WTTP_*` substitution.
    pub command: Vec<String>,

    /// Suppress the command's output (default: true).
    pub quiet: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            quiet: true,
        }
    }
}

impl StageConfig {
    pub fn is_enabled(&self) -> bool {
        !self.command.is_empty()
    }

    fn validate(&self, field: FieldPath, diag: &mut ConfigDiagnostics) {
        let Some(cmd) = self.command.first() else {
            return;
        };

        if which::which(cmd).is_err() {
            if PACKAGE_RUNNERS.contains(&cmd.as_str()) {
                diag.warn(field, format!("`{cmd}` not found on PATH"));
            } else {
                diag.error_with_hint(
                    field,
                    format!("`{cmd}` not found"),
                    format!("install the command or update {field}"),
                );
            }
        }
    }
}
