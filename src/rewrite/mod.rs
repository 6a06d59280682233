//! Source reference rewriting (prebuild).
//!
//! For every source file: scan for path literals, resolve each one, publish
//! the asset it names and replace the literal with a `wttp://` address.
//!
//! ```text
//! const logo = "./logo.png";
//!   → pin logo.png, chunk {"link":…,"type":"image/png"} to /logo.png
//!   → const logo = "wttp://0x…/logo.png/?chain=poly";
//! ```

pub mod address;
pub mod scan;

pub use address::AddressBuilder;
pub use scan::{LiteralShape, Reference};

use jwalk::WalkDir;
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::asset::{AssetResolver, ResolvedAsset, StrategySelector};
use crate::error::PublishError;
use crate::publish::Publisher;
use crate::report::PublicationReport;
use crate::{debug, log};

/// Source extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Top-level import statement, including side-effect imports.
static IMPORT_STMT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import(?:[ \t\r\n{*][^;'"]*?)?(?:"[^"\r\n]*"|'[^'\r\n]*');?"#).unwrap()
});

/// Replacement computed for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub reference: Reference,
    pub new_literal: String,
}

pub struct Rewriter {
    resolver: AssetResolver,
    selector: StrategySelector,
    publisher: Arc<Publisher>,
    addresses: AddressBuilder,
    extensions: Vec<String>,
    dry_run: bool,
}

impl Rewriter {
    pub fn new(
        resolver: AssetResolver,
        selector: StrategySelector,
        publisher: Arc<Publisher>,
        addresses: AddressBuilder,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            resolver,
            selector,
            publisher,
            addresses,
            extensions,
            dry_run: false,
        }
    }

    /// Plan and publish without writing source files back.
    pub fn dry_run(mut self, enable: bool) -> Self {
        self.dry_run = enable;
        self
    }

    /// Rewrite every source file under the source root, one at a time.
    ///
    /// Returns the modified files in walk order.
    pub async fn rewrite_dir(
        &self,
        report: &mut PublicationReport,
    ) -> Result<Vec<PathBuf>, PublishError> {
        let files = self.source_files();
        debug!("rewrite"; "{} source file(s) under {}", files.len(), self.resolver.source_root().display());

        let mut modified = Vec::new();
        for file in files {
            if self.rewrite(&file, report).await? {
                modified.push(file);
            }
        }
        Ok(modified)
    }

    /// Rewrite one file. Returns whether it was (or, in a dry run, would
    /// be) written back.
    pub async fn rewrite(
        &self,
        file: &Path,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        let text = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| PublishError::io(file, e))?;

        let results = self.plan(file, &text, report).await?;
        if results.is_empty() {
            return Ok(false);
        }

        if self.dry_run {
            for result in &results {
                log!("dry-run"; "{}: `{}` -> `{}`", file.display(), result.reference.literal_text, result.new_literal);
            }
        } else {
            let rewritten = apply(&text, &results);
            tokio::fs::write(file, rewritten)
                .await
                .map_err(|e| PublishError::io(file, e))?;
            log!("rewrite"; "{} ({} reference(s))", file.display(), results.len());
        }
        report.record_rewrite(file.display().to_string());
        Ok(true)
    }

    /// Resolve and publish every reference in `text`, in discovery order.
    ///
    /// Unresolved references produce no result.
    pub async fn plan(
        &self,
        file: &Path,
        text: &str,
        report: &mut PublicationReport,
    ) -> Result<Vec<RewriteResult>, PublishError> {
        let mut results = Vec::new();
        for reference in scan::scan(file, text) {
            let Some(asset) = self.resolver.resolve(&reference) else {
                debug!("rewrite"; "{}: `{}` left as is", file.display(), reference.literal_text);
                continue;
            };

            let normalized = address::normalize_resource_path(&asset.relative_path);
            self.publish_asset(&asset, &normalized, report).await?;

            let new_literal = format!(
                "const {} = \"{}\";",
                reference.binding_name,
                self.addresses.url(&normalized)
            );
            debug!("rewrite"; "{:?} `{}` -> `{}`", reference.shape, reference.literal_text, new_literal);
            results.push(RewriteResult {
                reference,
                new_literal,
            });
        }
        Ok(results)
    }

    async fn publish_asset(
        &self,
        asset: &ResolvedAsset,
        normalized: &str,
        report: &mut PublicationReport,
    ) -> Result<bool, PublishError> {
        let resource_path = AddressBuilder::resource_path(normalized);
        let content_type = asset.content_type();

        self.publisher
            .file(
                self.selector.select(asset),
                &resource_path,
                &asset.absolute_path,
                content_type,
                report,
            )
            .await
    }

    /// Source files with a configured extension, sorted.
    fn source_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(self.resolver.source_root())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            })
            .collect();
        files.sort();
        files
    }
}

/// Splice replacements into `text` by span, then move any replacement
/// left above a remaining import statement below the last import.
pub fn apply(text: &str, results: &[RewriteResult]) -> String {
    let (spliced, placed) = splice(text, results);
    hoist_below_imports(spliced, &placed)
}

/// Returns the new text and the byte range of every replacement in it.
fn splice(text: &str, results: &[RewriteResult]) -> (String, Vec<Range<usize>>) {
    let mut ordered: Vec<&RewriteResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.reference.span.start);

    let mut out = String::with_capacity(text.len());
    let mut placed = Vec::with_capacity(ordered.len());
    let mut cursor = 0;
    for result in ordered {
        let span = &result.reference.span;
        out.push_str(&text[cursor..span.start]);
        let start = out.len();
        out.push_str(&result.new_literal);
        placed.push(start..out.len());
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    (out, placed)
}

/// Imports must precede declarations, so a `const` that replaced an import
/// cannot stay above an import that was left alone.
fn hoist_below_imports(text: String, placed: &[Range<usize>]) -> String {
    let Some(last_import) = IMPORT_STMT_RE.find_iter(&text).last() else {
        return text;
    };
    let misplaced: Vec<&Range<usize>> = placed
        .iter()
        .filter(|range| range.end <= last_import.start())
        .collect();
    if misplaced.is_empty() {
        return text;
    }

    let line_end = text[last_import.end()..]
        .find('\n')
        .map_or(text.len(), |i| last_import.end() + i);

    let mut out = String::with_capacity(text.len() + misplaced.len());
    let mut moved = Vec::with_capacity(misplaced.len());
    let mut cursor = 0;
    for range in misplaced {
        out.push_str(&text[cursor..range.start]);
        moved.push(&text[range.clone()]);
        cursor = range.end;

        // drop the line the statement leaves empty
        if out.is_empty() || out.ends_with('\n') {
            let rest = &text[cursor..];
            if rest.starts_with("\r\n") {
                cursor += 2;
            } else if rest.starts_with('\n') {
                cursor += 1;
            }
        }
    }
    out.push_str(&text[cursor..line_end]);
    for statement in moved {
        out.push('\n');
        out.push_str(statement);
    }
    out.push_str(&text[line_end..]);
    out
}
