//! Chunk codec: payload ↔ ordered chunks ↔ hex transport encoding.
//!
//! Pure functions, no side effects. A payload is cut into contiguous
//! character runs of at most `chunk_size` characters (the last one may be
//! shorter, nothing is padded) and each run is carried as `0x`-prefixed hex
//! of its bytes. Concatenating the decoded bytes of every chunk in index
//! order gives back the original payload.

use thiserror::Error;

/// Default chunk size in characters, sized to fit one store transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 14_576;

/// Reserved per-chunk flag, passed through to the store unchanged.
pub const DEFAULT_FLAG: u8 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("payload is not `0x`-prefixed hex: {0}")]
    InvalidHex(String),

    #[error("decoded payload is not valid UTF-8")]
    InvalidUtf8,
}

/// One bounded slice of a resource, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Resource path inside the store (e.g. `/index.html`).
    pub resource_path: String,
    /// 0-based, dense position of this chunk within the resource.
    pub index: usize,
    /// Content type recorded alongside every chunk of the resource.
    pub content_type: String,
    /// Hex transport encoding of the chunk text.
    pub payload: String,
    /// Reserved marker, forwarded verbatim.
    pub flag: u8,
    /// Size of the chunk text in bytes (before hex encoding).
    pub raw_len: usize,
}

/// Split `payload` into `ceil(chars / chunk_size)` contiguous slices.
///
/// An empty payload yields no slices.
pub fn split(payload: &str, chunk_size: usize) -> Result<Vec<&str>, CodecError> {
    if chunk_size == 0 {
        return Err(CodecError::ZeroChunkSize);
    }

    let mut slices = Vec::with_capacity(payload.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in payload.char_indices() {
        if count == chunk_size {
            slices.push(&payload[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if count > 0 {
        slices.push(&payload[start..]);
    }

    Ok(slices)
}

/// Encode one chunk's text as `0x`-prefixed lowercase hex.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(2 + text.len() * 2);
    out.push_str("0x");
    out.push_str(&hex::encode(text.as_bytes()));
    out
}

/// Decode one `0x`-prefixed hex payload back into bytes.
pub fn decode(payload: &str) -> Result<Vec<u8>, CodecError> {
    let digits = payload
        .strip_prefix("0x")
        .ok_or_else(|| CodecError::InvalidHex(payload.chars().take(16).collect()))?;
    hex::decode(digits).map_err(|_| CodecError::InvalidHex(payload.chars().take(16).collect()))
}

/// Reassemble a payload from its encoded chunks in index order.
pub fn decode_all<'a, I>(payloads: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut bytes = Vec::new();
    for payload in payloads {
        bytes.extend(decode(payload)?);
    }
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

/// Cut a resource into encoded chunks with dense indices `0..n`.
pub fn chunk_resource(
    resource_path: &str,
    content: &str,
    content_type: &str,
    chunk_size: usize,
) -> Result<Vec<Chunk>, CodecError> {
    Ok(split(content, chunk_size)?
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            resource_path: resource_path.to_string(),
            index,
            content_type: content_type.to_string(),
            payload: encode(text),
            flag: DEFAULT_FLAG,
            raw_len: text.len(),
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
