//! Postbuild publication of the entry document and its two bundles.
//!
//! The build emits one style bundle and one script bundle referenced from
//! `index.html`:
//!
//! ```text
//! <link href="/static/css/main.1a2b.css" rel="stylesheet">
//! <script defer="defer" src="/static/js/main.3c4d.js"></script>
//! ```
//!
//! Both tags are pointed at the store (`/styles.css`, `/script.js`), the
//! rewritten document is written back and published as `/`, then each
//! bundle is published under its fixed path.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use super::Publisher;
use crate::asset::{AssetRole, StrategySelector};
use crate::error::PublishError;
use crate::report::PublicationReport;
use crate::rewrite::AddressBuilder;
use crate::utils::mime::{self, types};
use crate::{debug, log};

pub const ENTRY_RESOURCE: &str = "/";
pub const STYLE_RESOURCE: &str = "/styles.css";
pub const SCRIPT_RESOURCE: &str = "/script.js";

static STYLE_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/static/css/([^"]+)""#).unwrap());

static SCRIPT_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="/static/js/([^"]+)""#).unwrap());

static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link[ \t\r\n]+href="/static/css/[^"]+"[^>]*>"#).unwrap());

static SCRIPT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script[ \t\r\n]+defer="defer"[ \t\r\n]+src="/static/js/[^"]+"></script>"#)
        .unwrap()
});

/// Bundle file names found in the entry document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleRefs {
    /// Name under `static/css/`.
    pub style: Option<String>,
    /// Name under `static/js/`.
    pub script: Option<String>,
}

/// First style and script bundle referenced by `html`.
pub fn find_bundles(html: &str) -> BundleRefs {
    let capture = |re: &Regex| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };
    BundleRefs {
        style: capture(&STYLE_HREF_RE),
        script: capture(&SCRIPT_SRC_RE),
    }
}

/// Point the first bundle tags of `html` at the store.
///
/// Tag addresses carry no chain suffix.
pub fn rewrite_entry(html: &str, addresses: &AddressBuilder) -> String {
    let script_tag = format!(
        r#"<script defer="defer" src="{}"></script>"#,
        addresses.bare_url(SCRIPT_RESOURCE)
    );
    let link_tag = format!(
        r#"<link href="{}" rel="stylesheet">"#,
        addresses.bare_url(STYLE_RESOURCE)
    );

    let html = SCRIPT_TAG_RE.replace(html, regex::NoExpand(&script_tag));
    LINK_TAG_RE
        .replace(&html, regex::NoExpand(&link_tag))
        .into_owned()
}

pub struct BundlePublisher {
    publisher: Arc<Publisher>,
    selector: StrategySelector,
    addresses: AddressBuilder,
    build_dir: PathBuf,
    entry: String,
    dry_run: bool,
}

impl BundlePublisher {
    pub fn new(
        publisher: Arc<Publisher>,
        selector: StrategySelector,
        addresses: AddressBuilder,
        build_dir: impl Into<PathBuf>,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            selector,
            addresses,
            build_dir: build_dir.into(),
            entry: entry.into(),
            dry_run: false,
        }
    }

    /// Publish the rewritten entry document without writing it back.
    pub fn dry_run(mut self, enable: bool) -> Self {
        self.dry_run = enable;
        self
    }

    fn entry_path(&self) -> PathBuf {
        self.build_dir.join(&self.entry)
    }

    /// Rewrite and publish the entry document, then both bundles.
    pub async fn publish(&self, report: &mut PublicationReport) -> Result<(), PublishError> {
        let entry_path = self.entry_path();
        if !entry_path.is_file() {
            return Err(PublishError::MissingEntry(entry_path));
        }

        let html = tokio::fs::read_to_string(&entry_path)
            .await
            .map_err(|e| PublishError::io(&entry_path, e))?;
        let bundles = find_bundles(&html);
        let html = rewrite_entry(&html, &self.addresses);
        if self.dry_run {
            log!("dry-run"; "{} left as is", entry_path.display());
            if bundles.script.is_some() {
                log!("dry-run"; "script tag -> {}", self.addresses.bare_url(SCRIPT_RESOURCE));
            }
            if bundles.style.is_some() {
                log!("dry-run"; "style tag -> {}", self.addresses.bare_url(STYLE_RESOURCE));
            }
        } else {
            tokio::fs::write(&entry_path, &html)
                .await
                .map_err(|e| PublishError::io(&entry_path, e))?;
        }

        log!("publish"; "{} as {}", entry_path.display(), ENTRY_RESOURCE);
        debug!("publish"; "entry document is {:?}", self.selector.select_role(AssetRole::EntryDocument));
        self.publisher
            .inline(ENTRY_RESOURCE, &html, types::HTML, report)
            .await?;

        let style = bundles
            .style
            .map(|name| self.build_dir.join("static").join("css").join(name));
        self.publish_bundle(style.as_deref(), STYLE_RESOURCE, report)
            .await?;

        let script = bundles
            .script
            .map(|name| self.build_dir.join("static").join("js").join(name));
        self.publish_bundle(script.as_deref(), SCRIPT_RESOURCE, report)
            .await
    }

    async fn publish_bundle(
        &self,
        file: Option<&Path>,
        resource_path: &str,
        report: &mut PublicationReport,
    ) -> Result<(), PublishError> {
        let Some(file) = file else {
            log!("publish"; "no bundle for {} referenced in {}", resource_path, self.entry);
            return Ok(());
        };
        let content_type = mime::from_path(file);

        let strategy = self.selector.select_role(AssetRole::Bundle);
        debug!("publish"; "{} as {} ({:?})", file.display(), resource_path, strategy);

        self.publisher
            .file(strategy, resource_path, file, content_type, report)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinning::StaticPinner;
    use crate::publish::FailurePolicy;
    use crate::publish::POINTER_CONTENT_TYPE;
    use crate::publish::testing::publisher;
    use crate::store::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = concat!(
        r#"<!doctype html><html><head>"#,
        r#"<script defer="defer" src="/static/js/main.3c4d.js"></script>"#,
        r#"<link href="/static/css/main.1a2b.css" rel="stylesheet">"#,
        r#"</head><body><div id="root"></div></body></html>"#
    );

    fn build_dir(dir: &TempDir) -> PathBuf {
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("static/css")).unwrap();
        fs::create_dir_all(build.join("static/js")).unwrap();
        fs::write(build.join("index.html"), INDEX).unwrap();
        fs::write(build.join("static/css/main.1a2b.css"), "body{margin:0}").unwrap();
        fs::write(build.join("static/js/main.3c4d.js"), "console.log(1)").unwrap();
        build
    }

    fn bundle_publisher(store: &Arc<MemoryStore>, build: &Path, inline_bundles: bool) -> BundlePublisher {
        let publisher = Arc::new(publisher(store, Arc::new(StaticPinner("QmBundle")), FailurePolicy::Continue));
        let addresses = AddressBuilder::new("wttp", "0xSTORE", Some("base"));
        BundlePublisher::new(
            publisher,
            StrategySelector::new(inline_bundles),
            addresses,
            build,
            "index.html",
        )
    }

    #[test]
    fn test_find_bundles() {
        let refs = find_bundles(INDEX);
        assert_eq!(refs.style.as_deref(), Some("main.1a2b.css"));
        assert_eq!(refs.script.as_deref(), Some("main.3c4d.js"));

        assert_eq!(find_bundles("<html></html>"), BundleRefs::default());
    }

    #[test]
    fn test_rewrite_entry_tags() {
        let html = rewrite_entry(INDEX, &AddressBuilder::new("wttp", "0xSTORE", Some("poly")));
        assert!(html.contains(r#"<script defer="defer" src="wttp://0xSTORE/script.js"></script>"#));
        assert!(html.contains(r#"<link href="wttp://0xSTORE/styles.css" rel="stylesheet">"#));
        assert!(!html.contains("/static/"));
    }

    #[tokio::test]
    async fn test_publish_inline_bundles() {
        let dir = TempDir::new().unwrap();
        let build = build_dir(&dir);
        let store = Arc::new(MemoryStore::new());
        let mut report = PublicationReport::new();

        bundle_publisher(&store, &build, true)
            .publish(&mut report)
            .await
            .unwrap();

        let published = store.read("/").unwrap();
        assert_eq!(published, fs::read_to_string(build.join("index.html")).unwrap());
        assert!(published.contains("wttp://0xSTORE/script.js"));
        assert_eq!(store.read("/styles.css").unwrap(), "body{margin:0}");
        assert_eq!(store.read("/script.js").unwrap(), "console.log(1)");
        assert_eq!(store.chunks("/script.js")[0].content_type, "application/javascript");

        let order: Vec<_> = store.submissions().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["/", "/styles.css", "/script.js"]);
        assert_eq!(report.pinned_files, 0);
        assert_eq!(report.resources, 3);
    }

    #[tokio::test]
    async fn test_publish_pinned_bundles() {
        let dir = TempDir::new().unwrap();
        let build = build_dir(&dir);
        let store = Arc::new(MemoryStore::new());
        let mut report = PublicationReport::new();

        bundle_publisher(&store, &build, false)
            .publish(&mut report)
            .await
            .unwrap();

        assert_eq!(store.chunks("/").len(), 1);
        assert_eq!(store.chunks("/").first().unwrap().content_type, "text/html");
        assert_eq!(
            store.read("/styles.css").unwrap(),
            r#"{"link":"https://gw/ipfs/QmBundle","type":"text/css"}"#
        );
        assert_eq!(store.chunks("/script.js")[0].content_type, POINTER_CONTENT_TYPE);
        assert_eq!(report.pinned_files, 2);
    }

    #[tokio::test]
    async fn test_large_entry_document_chunks() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("index.html"), "a".repeat(30_000)).unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut report = PublicationReport::new();
        bundle_publisher(&store, &build, true)
            .publish(&mut report)
            .await
            .unwrap();

        let chunks = store.chunks("/");
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(chunks[2].raw_len, 30_000 - 2 * 14_576);
        // no bundle tags, nothing else published
        assert_eq!(store.paths(), vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn test_dry_run_keeps_entry_document() {
        let dir = TempDir::new().unwrap();
        let build = build_dir(&dir);
        let store = Arc::new(MemoryStore::new());
        let mut report = PublicationReport::new();

        bundle_publisher(&store, &build, true)
            .dry_run(true)
            .publish(&mut report)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(build.join("index.html")).unwrap(), INDEX);
        // the store still gets the rewritten document
        assert!(store.read("/").unwrap().contains("wttp://0xSTORE/script.js"));
        assert_eq!(report.resources, 3);
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut report = PublicationReport::new();
        let err = bundle_publisher(&store, dir.path(), true)
            .publish(&mut report)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MissingEntry(_)));
    }
}
