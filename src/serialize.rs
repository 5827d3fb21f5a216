//! Tree to HTML string.
//!
//! Output keeps non-ASCII characters as they are and escapes only what would
//! change the markup: `&`, `<` and `>` in text, `&` and `"` in attribute
//! values. Raw-text elements (`script`, `style`, `iframe`, `xmp`, ...) are
//! written unescaped.

use crate::dom::{is_raw_text_element, is_void_element, trim_whitespace, Document, NodeData, NodeId};
use crate::encoding;
use regex::Regex;
use std::sync::LazyLock;

/// ASCII whitespace runs; non-breaking and other Unicode spaces are content.
#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\s)+").expect("valid regex"));

#[allow(clippy::expect_used)]
static BETWEEN_TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">(?-u:\s)+<").expect("valid regex"));

/// Comments and tags, the token boundaries for [`beautify`].
#[allow(clippy::expect_used)]
static MARKUP_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]+>").expect("valid regex"));

#[allow(clippy::expect_used)]
static LEADING_INDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]+").expect("valid regex"));

/// Tags that stay on their parent's indentation level in [`beautify`].
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdo", "big", "br", "button", "cite", "code", "dfn", "em", "i",
    "img", "kbd", "label", "map", "object", "q", "samp", "script", "select", "small", "strong",
    "sub", "sup", "textarea", "input", "time", "tt", "var",
];

/// Serialize the subtree at `node`, then compress or beautify it.
///
/// For the document root, its children are serialized in order.
#[must_use]
pub fn to_html_string(doc: &Document, node: NodeId, compress: bool) -> String {
    let mut html = String::new();
    write_node(doc, node, &mut html);

    if html.starts_with("<?xml") {
        if let Some(end) = html.find('>') {
            html.replace_range(..=end, "");
        }
    }

    if compress {
        compress_whitespace(&html)
    } else {
        beautify(&html)
    }
}

/// [`to_html_string`] encoded in the document's encoding.
#[must_use]
pub fn to_html_bytes(doc: &Document, node: NodeId, compress: bool) -> Vec<u8> {
    encoding::encode(&to_html_string(doc, node, compress), doc.encoding())
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document => {
            for &child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeData::Element(el) => {
            let name = el.name();
            out.push('<');
            out.push_str(name);
            for attr in el.attrs() {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }

            let raw = is_raw_text_element(name);
            for &child in doc.children(id) {
                match doc.data(child) {
                    NodeData::Text(text) if raw => out.push_str(text),
                    _ => write_node(doc, child, out),
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Collapse ASCII whitespace runs to one space, drop whitespace between tags
/// and trim both ends. Non-breaking spaces are kept.
///
/// Idempotent:
///
/// ```rust
/// use html_scrub::serialize::compress_whitespace;
///
/// let once = compress_whitespace("<div>\n  <p> a \t b </p>\n</div> ");
/// assert_eq!(once, "<div><p> a b </p></div>");
/// assert_eq!(compress_whitespace(&once), once);
/// ```
#[must_use]
pub fn compress_whitespace(html: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(html, " ");
    let tight = BETWEEN_TAGS_RE.replace_all(&collapsed, "><");
    trim_whitespace(&tight).to_string()
}

fn tag_name(token: &str) -> String {
    token
        .trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_inline_tag(token: &str) -> bool {
    INLINE_TAGS.contains(&tag_name(token).as_str())
}

fn is_self_closing(token: &str) -> bool {
    is_void_element(&tag_name(token)) || token.ends_with("/>")
}

fn split_markup(html: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in MARKUP_TOKEN_RE.find_iter(html) {
        if m.start() > last {
            tokens.push(&html[last..m.start()]);
        }
        tokens.push(m.as_str());
        last = m.end();
    }
    if last < html.len() {
        tokens.push(&html[last..]);
    }
    tokens
}

/// One tag, comment or text run per line, indented with tabs by nesting
/// depth.
///
/// Inline tags and void or `/>`-closed tags do not open a level. Unbalanced
/// closing tags never push the depth below zero.
///
/// ```rust
/// use html_scrub::serialize::beautify;
///
/// assert_eq!(
///     beautify("<div><p>Hi <b>there</b></p><br></div>"),
///     "<div>\n\t<p>\n\t\tHi\n\t\t<b>\n\t\tthere\n\t\t</b>\n\t</p>\n\t<br>\n</div>"
/// );
/// ```
#[must_use]
pub fn beautify(html: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;

    for token in split_markup(html) {
        let trimmed = trim_whitespace(token);
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("<!--") {
            push_line(&mut out, depth, trimmed);
        } else if trimmed.starts_with("</") {
            if !is_inline_tag(trimmed) {
                depth = depth.saturating_sub(1);
            }
            push_line(&mut out, depth, trimmed);
        } else if trimmed.starts_with('<') {
            push_line(&mut out, depth, trimmed);
            if !is_self_closing(trimmed) && !is_inline_tag(trimmed) {
                depth += 1;
            }
        } else {
            push_line(&mut out, depth, &WHITESPACE_RE.replace_all(trimmed, " "));
        }
    }

    out.trim_end_matches('\n').to_string()
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(line);
    out.push('\n');
}

/// Rewrite two-space indentation to `indent_size` copies of `indent_char`
/// per level.
///
/// With `indent_size == 0`, whitespace between tags is removed instead.
#[must_use]
pub fn reindent(html: &str, indent_size: usize, indent_char: char) -> String {
    if indent_size == 0 {
        return BETWEEN_TAGS_RE.replace_all(html, "><").into_owned();
    }
    let unit = indent_char.to_string().repeat(indent_size);
    LEADING_INDENT_RE
        .replace_all(html, |caps: &regex::Captures<'_>| unit.repeat(caps[0].len() / 2))
        .into_owned()
}
