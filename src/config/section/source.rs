//! `[source]` and `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [source]
//! root = "src"                              # Scanned for asset references
//! asset_dirs = ["assets", "images", "media"] # Fallback lookup dirs under root
//! extensions = ["js", "jsx", "ts", "tsx"]   # Source files to rewrite
//!
//! [build]
//! output = "build"                          # Build tool output directory
//! entry = "index.html"                      # Entry document inside output
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::asset::DEFAULT_ASSET_DIRS;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::rewrite::DEFAULT_EXTENSIONS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source root, relative to the project root.
    pub root: PathBuf,

    /// Subdirectories of `root` searched after the root itself.
    pub asset_dirs: Vec<String>,

    /// Extensions (without dot) of files whose references are rewritten.
    pub extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: "src".into(),
            asset_dirs: DEFAULT_ASSET_DIRS.iter().map(|d| d.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl SourceConfig {
    pub const ROOT: FieldPath = FieldPath::new("source.root");
    pub const ASSET_DIRS: FieldPath = FieldPath::new("source.asset_dirs");
    pub const EXTENSIONS: FieldPath = FieldPath::new("source.extensions");

    /// Checks that must run before paths are made absolute.
    pub fn validate_paths(&self, diag: &mut ConfigDiagnostics) {
        for dir in &self.asset_dirs {
            let path = std::path::Path::new(dir);
            if dir.is_empty() || path.is_absolute() {
                diag.error_with_hint(
                    Self::ASSET_DIRS,
                    format!("`{dir}` must be a relative directory name"),
                    format!("entries of {} are joined onto {}", Self::ASSET_DIRS, Self::ROOT),
                );
            }
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.root.is_dir() {
            diag.error(
                Self::ROOT,
                format!("{} directory not found: {}", Self::ROOT, self.root.display()),
            );
        }
        if self.extensions.is_empty() {
            diag.error(Self::EXTENSIONS, "no source extensions configured");
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.starts_with('.')) {
            diag.error_with_hint(
                Self::EXTENSIONS,
                format!("`{ext}` starts with a dot"),
                format!("write `{}`", ext.trim_start_matches('.')),
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build output directory, relative to the project root.
    pub output: PathBuf,

    /// Entry document file name inside `output`.
    pub entry: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "build".into(),
            entry: "index.html".into(),
        }
    }
}

impl BuildConfig {
    pub const ENTRY: FieldPath = FieldPath::new("build.entry");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.entry.trim().is_empty() {
            diag.error(Self::ENTRY, "entry document name is empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_source_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.source.root, PathBuf::from("src"));
        assert_eq!(config.source.asset_dirs, vec!["assets", "images", "media"]);
        assert_eq!(config.source.extensions, vec!["js", "jsx", "ts", "tsx"]);
        assert_eq!(config.build.output, PathBuf::from("build"));
        assert_eq!(config.build.entry, "index.html");
    }

    #[test]
    fn test_source_override() {
        let config = test_parse_config(
            "[source]\nroot = \"app\"\nasset_dirs = [\"static\"]\nextensions = [\"vue\"]\n[build]\noutput = \"dist\"",
        );
        assert_eq!(config.source.root, PathBuf::from("app"));
        assert_eq!(config.source.asset_dirs, vec!["static"]);
        assert_eq!(config.source.extensions, vec!["vue"]);
        assert_eq!(config.build.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_absolute_asset_dir_rejected() {
        let config = test_parse_config("[source]\nasset_dirs = [\"/etc\"]");
        let mut diag = crate::config::ConfigDiagnostics::new();
        config.source.validate_paths(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let mut config = test_parse_config("[source]\nextensions = [\".js\"]");
        config.source.root = std::env::temp_dir();
        let mut diag = crate::config::ConfigDiagnostics::new();
        config.source.validate(&mut diag);
        assert_eq!(diag.errors()[0].hint.as_deref(), Some("write `js`"));
    }
}
