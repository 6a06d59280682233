//! Project configuration management for `wttp.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── network    # [network], [report]
//! │   ├── source     # [source], [build]
//! │   ├── stages     # [stages.*]
//! │   └── store      # [store], [pinning], [strategy]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # PublishConfig (this file)
//! ```
//!
//! A missing `wttp.toml` is not an error: every section has defaults, and
//! `.env` in the project root is loaded before validation so credentials
//! can live next to the config.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildConfig, NetworkConfig, PinningConfig, ReportConfig, SourceConfig, StageConfig,
    StagesConfig, StoreConfig, StrategyConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, PublishArgs};
use crate::publish::FailurePolicy;
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Env file loaded from the project root.
const ENV_FILE: &str = ".env";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing wttp.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Use in-memory services (internal use only, from `--dry-run`)
    #[serde(skip)]
    pub dry_run: bool,

    pub source: SourceConfig,
    pub build: BuildConfig,
    pub network: NetworkConfig,
    pub store: StoreConfig,
    pub pinning: PinningConfig,
    pub strategy: StrategyConfig,
    pub stages: StagesConfig,
    pub report: ReportConfig,
}

impl PublishConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is
    /// the config file's parent, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                log!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    ..Self::default()
                }
            }
        };

        config.validate_paths()?;
        config.finalize(&cwd);
        config.load_env();
        config.apply_args(cli.args());
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Load `.env` from the project root. Existing variables win.
    fn load_env(&self) {
        let env_file = self.root.join(ENV_FILE);
        match dotenvy::from_path(&env_file) {
            Ok(()) => debug!("config"; "loaded {}", env_file.display()),
            Err(err) if err.not_found() => {}
            Err(err) => log!("warning"; "failed to load {}: {}", env_file.display(), err),
        }
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Set the root from the config location and make paths absolute.
    fn finalize(&mut self, cwd: &Path) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        self.normalize_paths(&root);
    }

    /// CLI flags override config values.
    fn apply_args(&mut self, args: &PublishArgs) {
        if let Some(name) = &args.network {
            self.network.name = Some(name.clone());
        }
        Self::update_option(&mut self.store.chunk_size, args.chunk_size.as_ref());
        if args.strict {
            self.store.on_chunk_failure = FailurePolicy::Abort;
        }
        self.dry_run = args.dry_run;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    fn normalize_paths(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        let root = normalize_path(root);
        self.config_path = normalize_path(&self.config_path);

        self.source.root = normalize_path(&root.join(&self.source.root));
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.report.path = normalize_path(&root.join(&self.report.path));
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Pre-validate paths before normalization.
    ///
    /// Must run before `finalize()`: normalization makes every path absolute.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.source.validate_paths(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Validate every section, collecting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.source.validate(&mut diag);
        self.build.validate(&mut diag);
        self.store.validate(self.dry_run, &mut diag);
        self.pinning.validate(self.dry_run, &mut diag);
        if !self.dry_run {
            self.stages.validate(&mut diag);
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PublishConfig {
    let (parsed, ignored) = PublishConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config rooted at `root` with normalized paths.
#[cfg(test)]
pub fn test_config_at(root: &Path, content: &str) -> PublishConfig {
    let mut config = test_parse_config(content);
    config.config_path = root.join("wttp.toml");
    config.finalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<PublishConfig, _> = toml::from_str("[store\nscheme = \"wttp\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[store]\nscheme = \"wttp\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PublishConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.store.scheme, "wttp");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_paths_normalized_against_root() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[build]\noutput = \"dist\"");

        let root = crate::utils::path::normalize_path(dir.path());
        assert_eq!(config.get_root(), root);
        assert_eq!(config.source.root, root.join("src"));
        assert_eq!(config.build.output, root.join("dist"));
        assert_eq!(config.report.path, root.join("deploy-report.json"));
        assert_eq!(config.root_relative(root.join("src/App.js")), PathBuf::from("src/App.js"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = test_parse_config("[network]\nname = \"base\"\n[store]\nchunk_size = 10");
        config.apply_args(&PublishArgs {
            chunk_size: Some(20),
            strict: true,
            dry_run: true,
            ..Default::default()
        });
        // no --network keeps the configured one
        assert_eq!(config.network.name.as_deref(), Some("base"));
        assert_eq!(config.store.chunk_size, 20);
        assert_eq!(config.store.on_chunk_failure, FailurePolicy::Abort);
        assert!(config.dry_run);

        config.apply_args(&PublishArgs {
            network: Some("polygon_mainnet".into()),
            ..Default::default()
        });
        assert_eq!(config.network.name.as_deref(), Some("polygon_mainnet"));
    }

    #[test]
    fn test_validate_collects_section_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let mut config = test_config_at(dir.path(), "[store]\nchunk_size = 0");
        config.dry_run = true;

        let err = config.validate().unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("store.chunk_size"));
    }

    #[test]
    fn test_dry_run_defaults_validate() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let mut config = test_config_at(dir.path(), "");
        config.dry_run = true;
        assert!(config.validate().is_ok());
    }
}
