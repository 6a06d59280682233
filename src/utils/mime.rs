//! Content type lookup.
//!
//! Fixed extension → MIME table used for every resource written to the
//! store and for the `type` field of pointer records. Unknown extensions
//! fall back to `text/plain`.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown";
    pub const CSV: &str = "text/csv";

    // Documents
    pub const PDF: &str = "application/pdf";

    // Binary
    pub const WASM: &str = "application/wasm";
    pub const ZIP: &str = "application/zip";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";

    // Audio
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG_AUDIO: &str = "audio/ogg";

    // Video
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Extensions whose references are never processed.
const STYLE_SHEET_EXTENSIONS: &[&str] = &[".css", ".scss", ".sass"];

/// Content type for a file path.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Content type for an extension (without the dot), case-insensitive.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    let Some(ext) = ext else {
        return types::PLAIN;
    };

    match ext.to_ascii_lowercase().as_str() {
        // Web / Text
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "json" => types::JSON,
        "xml" => types::XML,
        "csv" => types::CSV,
        "md" => types::MARKDOWN,
        "txt" => types::PLAIN,

        // Images
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "svg" => types::SVG,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,
        "bmp" => types::BMP,

        // Audio
        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG_AUDIO,

        // Video
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,

        // Fonts
        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,

        // Documents / Binary
        "pdf" => types::PDF,
        "wasm" => types::WASM,
        "zip" => types::ZIP,

        _ => types::PLAIN,
    }
}

/// Whether a raw reference names a style sheet (`.css`, `.scss`, `.sass`).
pub fn is_style_sheet(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    STYLE_SHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("main.3f2a.js")), types::JAVASCRIPT);
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("photo.JPEG")), types::JPEG);
        assert_eq!(from_path(&PathBuf::from("icon.svg")), types::SVG);
        assert_eq!(from_path(&PathBuf::from("doc.pdf")), types::PDF);
        assert_eq!(from_path(&PathBuf::from("font.woff2")), types::WOFF2);
    }

    #[test]
    fn test_unknown_defaults_to_plain_text() {
        assert_eq!(from_path(&PathBuf::from("data.xyz")), types::PLAIN);
        assert_eq!(from_path(&PathBuf::from("LICENSE")), types::PLAIN);
        assert_eq!(from_extension(None), types::PLAIN);
    }

    #[test]
    fn test_is_style_sheet() {
        assert!(is_style_sheet("./App.css"));
        assert!(is_style_sheet("theme.SCSS"));
        assert!(is_style_sheet("legacy.sass"));
        assert!(!is_style_sheet("./logo.png"));
        assert!(!is_style_sheet("./css-helpers.js"));
    }
}
