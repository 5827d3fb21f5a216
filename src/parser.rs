//! HTML parsing into the document arena.
//!
//! Markup is tokenized by `dom_query` (html5ever) and converted node by node
//! into a [`Document`]. Input without `<html>`, `<head>` or `<body>` tags is
//! parsed as a body fragment. Otherwise it is parsed as a whole document, and
//! the wrappers html5ever implies but the input never wrote are unwrapped, so
//! the tree only holds the wrapper elements the markup actually had.

use crate::dom::{trim_whitespace, Document, NodeId};
use crate::encoding::{self, encoding_for_label};
use crate::error::{Error, Result};
use crate::options::ParseOptions;
use dom_query::{Document as HtmlTree, NodeRef};
use regex::Regex;
use std::sync::LazyLock;

/// Bare `<source ...>` tags, rewritten to self-closed form.
#[allow(clippy::expect_used)]
static SOURCE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<source\b([^>]*?)\s*/?>").expect("valid regex"));

/// `<meta http-equiv="Content-Type" ...>`; input is already decoded.
#[allow(clippy::expect_used)]
static CONTENT_TYPE_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bhttp-equiv\s*=\s*["']?Content-Type["']?[^>]*>"#)
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static XML_DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\?xml[^>]*>").expect("valid regex"));

/// Document-level tags that select full-document parsing.
#[allow(clippy::expect_used)]
static DOCUMENT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(html|head|body)[\s/>]").expect("valid regex"));

/// Elements whose content is text, not markup.
const TEXT_CONTENT_TAGS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

/// Comments and text-only element bodies, which may mention tags that are
/// not really there.
#[allow(clippy::expect_used)]
static OPAQUE_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    let elements: Vec<String> = TEXT_CONTENT_TAGS
        .iter()
        .map(|tag| format!(r"<{tag}\b[^>]*>.*?</{tag}\s*>"))
        .collect();
    Regex::new(&format!(r"(?is)<!--.*?-->|{}", elements.join("|"))).expect("valid regex")
});

/// Which document-level wrappers the input wrote itself.
#[derive(Debug, Clone, Copy, Default)]
struct Wrappers {
    html: bool,
    head: bool,
    body: bool,
}

impl Wrappers {
    fn scan(html: &str) -> Self {
        let visible = OPAQUE_MARKUP_RE.replace_all(html, "");
        let mut found = Self::default();
        for caps in DOCUMENT_TAG_RE.captures_iter(&visible) {
            match caps[1].to_ascii_lowercase().as_str() {
                "html" => found.html = true,
                "head" => found.head = true,
                _ => found.body = true,
            }
        }
        found
    }

    fn any(self) -> bool {
        self.html || self.head || self.body
    }

    /// False for a wrapper the parser implied. Fragment parsing also adds a
    /// synthetic `html`, which is never kept.
    fn keeps(self, tag: &str) -> bool {
        match tag {
            "html" => self.html,
            "head" => self.head,
            "body" => self.body,
            _ => true,
        }
    }
}

/// Parse an HTML string with default options.
///
/// Malformed markup never fails; only blank input does.
///
/// ```rust
/// let doc = html_scrub::parse("<p>unclosed <b>bold</p>")?;
/// let p = doc.document_element().unwrap();
/// assert_eq!(doc.tag_name(p), Some("p"));
/// # Ok::<(), html_scrub::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the input is empty or only whitespace.
pub fn parse(html: &str) -> Result<Document> {
    parse_with_options(html, &ParseOptions::default())
}

/// Parse an HTML string, recording `options.encoding` as the output encoding.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for blank input or an unknown encoding label.
pub fn parse_with_options(html: &str, options: &ParseOptions) -> Result<Document> {
    let encoding = encoding_for_label(&options.encoding)?;
    let mut doc = build(html)?;
    doc.set_encoding(encoding);
    Ok(doc)
}

/// Decode and parse raw bytes.
///
/// A BOM or `<meta>` charset declaration takes precedence over
/// `options.encoding`, which is used when the bytes declare nothing.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for blank input or an unknown encoding label.
pub fn parse_bytes(html: &[u8], options: &ParseOptions) -> Result<Document> {
    let fallback = encoding_for_label(&options.encoding)?;
    let decoded = encoding::decode(html, fallback);
    let mut doc = build(&decoded.text)?;
    if decoded.had_errors {
        let message = format!(
            "malformed {} sequences replaced with U+FFFD",
            decoded.encoding.name()
        );
        log::debug!("{message}");
        doc.push_diagnostic(message);
    }
    doc.set_encoding(decoded.encoding);
    Ok(doc)
}

fn build(html: &str) -> Result<Document> {
    let mut diagnostics = Vec::new();
    let html = preprocess(html, &mut diagnostics);
    if trim_whitespace(&html).is_empty() {
        diagnostics.push("empty document".to_string());
        return Err(Error::ParseError(diagnostics));
    }

    let wrappers = Wrappers::scan(&html);
    let tree = if wrappers.any() {
        HtmlTree::from(html.as_str())
    } else {
        HtmlTree::fragment(html.as_str())
    };

    let mut doc = Document::new();
    let root = doc.root();
    for child in tree.root().children() {
        convert(&mut doc, root, &child, wrappers, &mut diagnostics);
    }

    for message in diagnostics {
        log::debug!("parse: {message}");
        doc.push_diagnostic(message);
    }
    Ok(doc)
}

fn preprocess(html: &str, diagnostics: &mut Vec<String>) -> String {
    let mut html = html.to_string();

    if let Some(m) = XML_DECLARATION_RE.find(&html) {
        diagnostics.push(format!("stripped XML declaration {:?}", m.as_str().trim()));
        html.replace_range(..m.end(), "");
    }

    let stripped = CONTENT_TYPE_META_RE.find_iter(&html).count();
    if stripped > 0 {
        diagnostics.push(format!("stripped {stripped} Content-Type meta tag(s)"));
        html = CONTENT_TYPE_META_RE.replace_all(&html, "").into_owned();
    }

    SOURCE_TAG_RE.replace_all(&html, "<source$1/>").into_owned()
}

fn convert(
    doc: &mut Document,
    parent: NodeId,
    node: &NodeRef<'_>,
    wrappers: Wrappers,
    diagnostics: &mut Vec<String>,
) {
    if node.is_element() {
        let Some(name) = node.node_name() else {
            return;
        };
        if !wrappers.keeps(&name) {
            for child in node.children() {
                convert(doc, parent, &child, wrappers, diagnostics);
            }
            return;
        }
        let id = doc.create_element(&name);
        for attr in node.attrs() {
            doc.set_attr(id, &attr.name.local, &attr.value);
        }
        doc.append_child(parent, id);
        for child in node.children() {
            convert(doc, id, &child, wrappers, diagnostics);
        }
    } else if node.is_text() {
        let text = node.text();
        if !trim_whitespace(&text).is_empty() {
            doc.append_text(parent, &text);
        }
    } else if node.is_comment() {
        let html = node.html();
        let body = html
            .strip_prefix("<!--")
            .and_then(|s| s.strip_suffix("-->"))
            .unwrap_or(&*html);
        if body.starts_with("?xml") {
            diagnostics.push("dropped XML declaration parsed as comment".to_string());
            return;
        }
        let id = doc.create_comment(body);
        doc.append_child(parent, id);
    }
    // doctypes and processing instructions are dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(doc: &Document) -> Vec<String> {
        doc.descendants(doc.root())
            .filter_map(|id| doc.tag_name(id).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_fragment_has_no_wrappers() {
        let doc = parse("<div><p>a</p></div>").unwrap();
        assert_eq!(tags(&doc), ["div", "p"]);
    }

    #[test]
    fn test_full_document_keeps_written_wrappers() {
        let doc = parse("<html><head></head><body><p>a</p></body></html>").unwrap();
        assert_eq!(tags(&doc), ["html", "head", "body", "p"]);
    }

    #[test]
    fn test_implied_wrappers_are_unwrapped() {
        let doc = parse("<html><body><p>a</p></body></html>").unwrap();
        assert_eq!(tags(&doc), ["html", "body", "p"]);

        let doc = parse("<head><title>t</title></head><p>a</p>").unwrap();
        assert_eq!(tags(&doc), ["head", "title", "p"]);
    }

    #[test]
    fn test_wrapper_scan_ignores_text_content() {
        let found = Wrappers::scan("<!-- <html> --><script>w('<body>')</script><title><head></title>");
        assert!(!found.any());
        let found = Wrappers::scan("<BODY class=x><p>a</p>");
        assert!(found.body && !found.html && !found.head);
    }

    #[test]
    fn test_whitespace_text_is_dropped() {
        let doc = parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>").unwrap();
        let ul = doc.document_element().unwrap();
        assert_eq!(doc.children(ul).len(), 2);
    }

    #[test]
    fn test_content_type_meta_is_stripped() {
        let doc = parse(
            r#"<meta http-equiv="Content-Type" content="text/html; charset=gbk"><p>x</p>"#,
        )
        .unwrap();
        assert_eq!(tags(&doc), ["p"]);
        assert!(doc.diagnostics().iter().any(|d| d.contains("Content-Type")));
    }

    #[test]
    fn test_source_tags_are_closed() {
        let doc = parse(r#"<video><source src="a.mp4"><p>fallback</p></video>"#).unwrap();
        let video = doc.document_element().unwrap();
        let children: Vec<_> = doc
            .children(video)
            .iter()
            .filter_map(|&c| doc.tag_name(c))
            .collect();
        assert_eq!(children, ["source", "p"]);
    }

    #[test]
    fn test_xml_declaration_is_stripped() {
        let doc = parse(r#"<?xml encoding="UTF-8"><p>x</p>"#).unwrap();
        assert_eq!(tags(&doc), ["p"]);
        assert!(!doc.descendants(doc.root()).any(|id| doc.is_comment(id)));
    }

    #[test]
    fn test_comments_are_kept() {
        let doc = parse("<div><!-- note --><p>x</p></div>").unwrap();
        let comment = doc
            .descendants(doc.root())
            .find(|&id| doc.is_comment(id))
            .unwrap();
        assert_eq!(doc.node_value(comment), Some(" note "));
    }

    #[test]
    fn test_attributes_keep_order() {
        let doc = parse(r#"<a href="x" id="i" data-foo="z">t</a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let names: Vec<_> = doc.attrs(a).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["href", "id", "data-foo"]);
    }

    #[test]
    fn test_blank_input_fails() {
        assert!(matches!(parse("  \n "), Err(Error::ParseError(_))));
        assert!(matches!(parse(""), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_unknown_encoding_fails() {
        let opts = ParseOptions {
            encoding: "nope".into(),
        };
        assert!(matches!(
            parse_with_options("<p>x</p>", &opts),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_bytes_uses_declared_charset() {
        let doc = parse_bytes(
            b"<meta charset=\"windows-1252\"><p>Caf\xE9</p>",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.encoding().name(), "windows-1252");
        let p = doc.first_by_tag(doc.root(), "p").unwrap();
        assert_eq!(doc.text_content(p), "Café");
    }

    #[test]
    fn test_entities_are_decoded() {
        let doc = parse("<p>a &amp; b &lt;c&gt; &eacute;</p>").unwrap();
        let p = doc.document_element().unwrap();
        assert_eq!(doc.text_content(p), "a & b <c> é");
    }
}
