//! Reference → physical file resolution.
//!
//! Candidate roots are tried in order, first existing file wins:
//!
//! 1. the referencing file's own directory
//! 2. the source root
//! 3. each asset subdirectory under the source root (`assets`, `images`, `media`)
//!
//! Joins are lexical so resolved paths keep the shape of the source root
//! they were found under.

use std::path::{Path, PathBuf};

use crate::rewrite::scan::Reference;
use crate::utils::mime;
use crate::utils::path::{lexical_normalize, relative_to};

/// Asset subdirectories searched when none are configured.
pub const DEFAULT_ASSET_DIRS: &[&str] = &["assets", "images", "media"];

/// A reference whose path names an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub reference: Reference,
    pub absolute_path: PathBuf,
    /// Relative to the referencing file's directory.
    pub relative_path: PathBuf,
    /// Lowercase, without the dot. Empty when the file has none.
    pub extension: String,
}

impl ResolvedAsset {
    pub fn content_type(&self) -> &'static str {
        mime::from_extension(Some(&self.extension))
    }
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    source_root: PathBuf,
    asset_dirs: Vec<String>,
}

impl AssetResolver {
    pub fn new(source_root: impl Into<PathBuf>, asset_dirs: Vec<String>) -> Self {
        Self {
            source_root: source_root.into(),
            asset_dirs,
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Whether a raw path is ever considered for resolution.
    ///
    /// Remote URLs, data URIs and style sheets are skipped up front.
    pub fn is_candidate(raw_path: &str) -> bool {
        !(raw_path.starts_with("http") || raw_path.starts_with("data:") || mime::is_style_sheet(raw_path))
    }

    /// Find the file `raw_path` names when referenced from `source_file`.
    pub fn resolve_path(&self, raw_path: &str, source_file: &Path) -> Option<PathBuf> {
        if !Self::is_candidate(raw_path) {
            return None;
        }

        let file_dir = source_file.parent().unwrap_or(Path::new(""));
        std::iter::once(file_dir.to_path_buf())
            .chain(std::iter::once(self.source_root.clone()))
            .chain(self.asset_dirs.iter().map(|dir| self.source_root.join(dir)))
            .map(|root| lexical_normalize(&root.join(raw_path)))
            .find(|candidate| candidate.is_file())
    }

    /// Resolve a scanned reference. `None` leaves the literal untouched.
    pub fn resolve(&self, reference: &Reference) -> Option<ResolvedAsset> {
        let absolute_path = self.resolve_path(&reference.raw_path, &reference.source_file)?;
        let file_dir = reference.source_file.parent().unwrap_or(Path::new(""));
        let relative_path = relative_to(&absolute_path, file_dir);
        let extension = absolute_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        Some(ResolvedAsset {
            reference: reference.clone(),
            absolute_path,
            relative_path,
            extension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::scan::scan;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(root: &Path) -> AssetResolver {
        let dirs = DEFAULT_ASSET_DIRS.iter().map(|d| d.to_string()).collect();
        AssetResolver::new(root, dirs)
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_resolves_next_to_source_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("components/logo.png"));

        let found = resolver(&src).resolve_path("./logo.png", &src.join("components/Header.js"));
        assert_eq!(found, Some(src.join("components/logo.png")));
    }

    #[test]
    fn test_source_root_beats_asset_dirs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("logo.png"));
        touch(&src.join("assets/logo.png"));

        let found = resolver(&src).resolve_path("logo.png", &src.join("components/Header.js"));
        assert_eq!(found, Some(src.join("logo.png")));
    }

    #[test]
    fn test_falls_back_to_asset_dirs_in_order() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("images/hero.jpg"));
        touch(&src.join("media/hero.jpg"));

        let found = resolver(&src).resolve_path("hero.jpg", &src.join("App.js"));
        assert_eq!(found, Some(src.join("images/hero.jpg")));
    }

    #[test]
    fn test_skips_remote_data_and_style_sheets() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("App.css"));

        let r = resolver(&src);
        let file = src.join("App.js");
        assert_eq!(r.resolve_path("./App.css", &file), None);
        assert_eq!(r.resolve_path("https://cdn.example/logo.png", &file), None);
        assert_eq!(r.resolve_path("data:image/png;base64,AAAA", &file), None);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        assert_eq!(resolver(&src).resolve_path("./nope.png", &src.join("App.js")), None);
    }

    #[test]
    fn test_directory_is_not_a_match() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("images")).unwrap();
        assert_eq!(resolver(&src).resolve_path("images", &src.join("App.js")), None);
    }

    #[test]
    fn test_resolve_reference_relative_path() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("assets/Logo.PNG"));

        let file = src.join("components/Header.js");
        let refs = scan(&file, r#"import logo from "../assets/Logo.PNG";"#);
        let asset = resolver(&src).resolve(&refs[0]).unwrap();

        assert_eq!(asset.absolute_path, src.join("assets/Logo.PNG"));
        assert_eq!(asset.relative_path, PathBuf::from("../assets/Logo.PNG"));
        assert_eq!(asset.extension, "png");
        assert_eq!(asset.content_type(), "image/png");
    }

    #[test]
    fn test_asset_dir_match_relative_to_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("media/clip.mp4"));

        let file = src.join("pages/home/Home.jsx");
        let refs = scan(&file, r#"const clip = "clip.mp4";"#);
        let asset = resolver(&src).resolve(&refs[0]).unwrap();
        assert_eq!(asset.relative_path, PathBuf::from("../../media/clip.mp4"));
    }
}
