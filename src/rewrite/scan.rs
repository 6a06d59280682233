//! Lexical scan for asset-path literals bound to identifiers.
//!
//! Two literal shapes are recognized, each by its own matcher:
//!
//! ```text
//! import logo from "./logo.png";      // LiteralShape::Import
//! const hero = './images/hero.jpg';   // LiteralShape::Assignment
//! ```
//!
//! The scan only reports structured matches (name, path, byte span); it
//! knows nothing about resolution or uploads.

use regex::{Captures, Regex};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Identifier and whitespace classes are spelled out: the regex build has
/// no Unicode tables.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?-u:\b)import[ \t\r\n]+([A-Za-z_$][A-Za-z0-9_$]*)[ \t\r\n]+from[ \t\r\n]+(?:"([^"\r\n]+)"|'([^'\r\n]+)');?"#,
    )
    .unwrap()
});

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?-u:\b)const[ \t\r\n]+([A-Za-z_$][A-Za-z0-9_$]*)[ \t\r\n]*=[ \t\r\n]*(?:"([^"\r\n]+)"|'([^'\r\n]+)');?"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralShape {
    /// `import name from "path"`
    Import,
    /// `const name = "path"`
    Assignment,
}

/// One occurrence of a quoted path bound to an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source_file: PathBuf,
    /// Full matched statement, e.g. `import logo from "./logo.png";`.
    pub literal_text: String,
    pub binding_name: String,
    /// The quoted path, without quotes.
    pub raw_path: String,
    /// Byte range of `literal_text` in the original file text.
    pub span: Range<usize>,
    pub shape: LiteralShape,
}

/// Scan `text` (the content of `source_file`) for both literal shapes.
///
/// Matches are returned in text order. A match overlapping an earlier one
/// is dropped so every byte belongs to at most one reference.
pub fn scan(source_file: &Path, text: &str) -> Vec<Reference> {
    let mut found: Vec<Reference> = IMPORT_RE
        .captures_iter(text)
        .filter_map(|caps| to_reference(source_file, &caps, LiteralShape::Import))
        .chain(
            ASSIGN_RE
                .captures_iter(text)
                .filter_map(|caps| to_reference(source_file, &caps, LiteralShape::Assignment)),
        )
        .collect();

    found.sort_by_key(|r| r.span.start);

    let mut references: Vec<Reference> = Vec::with_capacity(found.len());
    for reference in found {
        let overlaps = references
            .last()
            .is_some_and(|prev| reference.span.start < prev.span.end);
        if !overlaps {
            references.push(reference);
        }
    }
    references
}

fn to_reference(source_file: &Path, caps: &Captures<'_>, shape: LiteralShape) -> Option<Reference> {
    let whole = caps.get(0)?;
    let name = caps.get(1)?;
    let path = caps.get(2).or_else(|| caps.get(3))?;

    Some(Reference {
        source_file: source_file.to_path_buf(),
        literal_text: whole.as_str().to_string(),
        binding_name: name.as_str().to_string(),
        raw_path: path.as_str().to_string(),
        span: whole.range(),
        shape,
    })
}
