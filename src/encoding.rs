//! Character encoding resolution, detection and transcoding.
//!
//! Input bytes are decoded with, in order of preference: a byte-order mark,
//! a `<meta>` charset declaration in the first kilobyte, or the caller's
//! declared label. Output bytes are encoded back into the document's encoding.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>/;]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Text decoded from bytes, with the encoding that was used.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Resolve a WHATWG encoding label such as `utf-8`, `GBK` or `latin1`.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for labels `encoding_rs` does not know.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::ParseError(vec![format!("unknown encoding label {label:?}")]))
}

/// Find the encoding declared by the bytes themselves (BOM or `<meta>`).
///
/// Only the first 1024 bytes are examined for meta tags.
#[must_use]
pub fn sniff_encoding(html: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(html) {
        return Some(encoding);
    }

    let head = String::from_utf8_lossy(&html[..html.len().min(1024)]);
    [&*CHARSET_META_RE, &*CONTENT_TYPE_CHARSET_RE]
        .iter()
        .filter_map(|re| re.captures(&head))
        .filter_map(|caps| caps.get(1))
        .find_map(|m| Encoding::for_label(m.as_str().as_bytes()))
}

/// Detect the encoding of HTML bytes, defaulting to UTF-8.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    sniff_encoding(html).unwrap_or(UTF_8)
}

/// Decode bytes, falling back to `fallback` when nothing is declared.
#[must_use]
pub fn decode(html: &[u8], fallback: &'static Encoding) -> Decoded {
    let encoding = sniff_encoding(html).unwrap_or(fallback);
    let (text, used, had_errors) = encoding.decode(html);
    Decoded {
        text: text.into_owned(),
        encoding: used,
        had_errors,
    }
}

/// Transcode HTML bytes to a UTF-8 string.
///
/// Invalid sequences become U+FFFD instead of failing.
///
/// ```
/// use html_scrub::encoding::transcode_to_utf8;
///
/// let html = b"<meta charset=\"windows-1252\"><p>Caf\xE9</p>";
/// assert!(transcode_to_utf8(html).contains("Café"));
/// ```
#[must_use]
pub fn transcode_to_utf8(html: &[u8]) -> String {
    decode(html, UTF_8).text
}

/// Encode a string in `encoding`.
///
/// Characters the encoding cannot represent become numeric character
/// references. UTF-16 encodings produce UTF-8, as `encoding_rs` does.
#[must_use]
pub fn encode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}
