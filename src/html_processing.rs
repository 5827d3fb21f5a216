//! In-place tree mutators.
//!
//! Every mutator takes the document and a subtree root, collects its targets
//! into a `Vec` before detaching anything, and returns the root so calls can
//! be chained. Running a mutator twice is a no-op the second time.

use crate::dom::{is_void_element, trim_whitespace, Document, NodeData, NodeId};
use crate::options::AttributeFilter;
use crate::xpath::XPath;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Elements hidden by inline style, the `hidden` attribute, `aria-hidden` or
/// a `hidden`/`hide` class token.
#[allow(clippy::expect_used)]
static HIDDEN_ELEMENTS: LazyLock<XPath> = LazyLock::new(|| {
    XPath::parse(
        ".//*[contains(@style, 'display:none') or contains(@style, 'display: none') \
         or contains(@style, 'visibility:hidden') or contains(@style, 'visibility: hidden') \
         or @hidden \
         or @aria-hidden='true' \
         or contains(concat(' ', normalize-space(@class), ' '), ' hidden ') \
         or contains(concat(' ', normalize-space(@class), ' '), ' hide ')]",
    )
    .expect("valid xpath")
});

fn detach_all(doc: &mut Document, targets: Vec<NodeId>) -> usize {
    let count = targets.len();
    for id in targets {
        doc.detach(id);
    }
    count
}

/// Remove every descendant element whose tag is in `tags`, with its subtree.
///
/// ```rust
/// use html_scrub::{html_processing::remove_tags, parse, to_html_string};
///
/// let mut doc = parse("<div><nav>menu</nav><p>text</p></div>")?;
/// let root = doc.root();
/// remove_tags(&mut doc, root, &["nav"]);
/// assert_eq!(to_html_string(&doc, root, true), "<div><p>text</p></div>");
/// # Ok::<(), html_scrub::Error>(())
/// ```
pub fn remove_tags<S: AsRef<str>>(doc: &mut Document, root: NodeId, tags: &[S]) -> NodeId {
    let tags: HashSet<String> = tags.iter().map(|t| t.as_ref().to_ascii_lowercase()).collect();
    if tags.is_empty() {
        return root;
    }
    let targets: Vec<NodeId> = doc
        .descendants(root)
        .filter(|&id| doc.tag_name(id).is_some_and(|t| tags.contains(t)))
        .collect();
    let removed = detach_all(doc, targets);
    if removed > 0 {
        log::debug!("removed {removed} element(s) matching {tags:?}");
    }
    root
}

/// Remove `<meta>` and `<link>`.
pub fn remove_meta(doc: &mut Document, root: NodeId) -> NodeId {
    remove_tags(doc, root, &["meta", "link"])
}

/// Remove `<style>`.
pub fn remove_styles(doc: &mut Document, root: NodeId) -> NodeId {
    remove_tags(doc, root, &["style"])
}

/// Remove `<script>`.
pub fn remove_scripts(doc: &mut Document, root: NodeId) -> NodeId {
    remove_tags(doc, root, &["script"])
}

/// Remove descendant elements that are hidden from readers.
///
/// Style checks are literal substring matches on the `style` attribute, not
/// CSS parsing.
pub fn remove_hidden_elements(doc: &mut Document, root: NodeId) -> NodeId {
    let targets = match HIDDEN_ELEMENTS.select_nodes(doc, root) {
        Ok(targets) => targets,
        Err(err) => {
            log::warn!("hidden element query failed: {err}");
            return root;
        }
    };
    let removed = detach_all(doc, targets);
    if removed > 0 {
        log::debug!("removed {removed} hidden element(s)");
    }
    root
}

/// Remove every comment node under `root`.
pub fn remove_comments(doc: &mut Document, root: NodeId) -> NodeId {
    let targets: Vec<NodeId> = doc
        .descendants(root)
        .filter(|&id| doc.is_comment(id))
        .collect();
    let removed = detach_all(doc, targets);
    if removed > 0 {
        log::debug!("removed {removed} comment(s)");
    }
    root
}

/// Drop attributes rejected by `filter` from `root` and every element below.
///
/// ```rust
/// use html_scrub::{html_processing::remove_attributes, options::AttributeFilter, parse};
///
/// let mut doc = parse(r#"<a href="x" onclick="y" data-foo="z" id="i">t</a>"#)?;
/// let a = doc.document_element().unwrap();
/// remove_attributes(&mut doc, a, &AttributeFilter::default().allow(["id", "href", "data-*"]));
/// let names: Vec<_> = doc.attrs(a).iter().map(|at| at.name.as_str()).collect();
/// assert_eq!(names, ["href", "data-foo", "id"]);
/// # Ok::<(), html_scrub::Error>(())
/// ```
pub fn remove_attributes(doc: &mut Document, root: NodeId, filter: &AttributeFilter) -> NodeId {
    let elements: Vec<NodeId> = std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|&id| doc.is_element(id))
        .collect();

    let mut removed = 0;
    for id in elements {
        let rejected: Vec<String> = doc
            .attrs(id)
            .iter()
            .filter(|attr| !filter.keeps(&attr.name))
            .map(|attr| attr.name.clone())
            .collect();
        for name in rejected {
            doc.remove_attr(id, &name);
            removed += 1;
        }
    }
    if removed > 0 {
        log::debug!("removed {removed} attribute(s)");
    }
    root
}

/// Prune blank text nodes and elements left without content, children
/// before parents.
///
/// An element is removed when it is not a void element, has no children
/// left and its text content is blank. Elements holding only a comment are
/// kept.
pub fn remove_empty_nodes(doc: &mut Document, root: NodeId) -> NodeId {
    // reverse document order visits children before their parents
    let nodes: Vec<NodeId> = doc.descendants(root).collect();
    let mut removed = 0;
    for id in nodes.into_iter().rev() {
        let empty = match doc.data(id) {
            NodeData::Text(value) => trim_whitespace(value).is_empty(),
            NodeData::Element(el) => {
                !is_void_element(el.name())
                    && doc.children(id).is_empty()
                    && trim_whitespace(&doc.text_content(id)).is_empty()
            }
            NodeData::Comment(_) | NodeData::Document => false,
        };
        if empty {
            doc.detach(id);
            removed += 1;
        }
    }
    if removed > 0 {
        log::debug!("removed {removed} empty node(s)");
    }
    root
}

fn is_absolute_link(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    value.is_empty()
        || value.starts_with('#')
        || value.starts_with("//")
        || ["http://", "https://", "data:", "mailto:", "tel:", "javascript:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
}

/// Prefix relative `href` and `src` values with `base_url`.
///
/// The base loses its trailing `/` and the value its leading `/`, joined by a
/// single `/`. Absolute and protocol-relative URLs, fragments and `data:`,
/// `mailto:`, `tel:` and `javascript:` links are left alone.
///
/// ```rust
/// use html_scrub::{html_processing::complete_relative_links, parse};
///
/// let mut doc = parse(r#"<a href="/docs/a.html">a</a><img src="//cdn/x.png">"#)?;
/// let root = doc.root();
/// complete_relative_links(&mut doc, root, "https://example.com/");
/// let a = doc.first_by_tag(root, "a").unwrap();
/// let img = doc.first_by_tag(root, "img").unwrap();
/// assert_eq!(doc.attr(a, "href"), Some("https://example.com/docs/a.html"));
/// assert_eq!(doc.attr(img, "src"), Some("//cdn/x.png"));
/// # Ok::<(), html_scrub::Error>(())
/// ```
pub fn complete_relative_links(doc: &mut Document, root: NodeId, base_url: &str) -> NodeId {
    let base = base_url.trim_end_matches('/');
    let elements: Vec<NodeId> = std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|&id| doc.is_element(id))
        .collect();

    for id in elements {
        for name in ["href", "src"] {
            let Some(value) = doc.attr(id, name) else {
                continue;
            };
            if is_absolute_link(value) {
                continue;
            }
            let joined = format!("{base}/{}", value.trim_start_matches('/'));
            doc.set_attr(id, name, &joined);
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, to_html_string};

    fn cleaned(html: &str, f: impl FnOnce(&mut Document, NodeId) -> NodeId) -> String {
        let mut doc = parse(html).unwrap();
        let root = doc.root();
        let returned = f(&mut doc, root);
        assert_eq!(returned, root);
        to_html_string(&doc, root, true)
    }

    #[test]
    fn test_remove_sibling_scripts_keeps_order() {
        let html = "<div><script>1</script><script>2</script><script>3</script><p>a</p><b>b</b></div>";
        let mut doc = parse(html).unwrap();
        let root = doc.root();
        let before = doc.len();
        remove_scripts(&mut doc, root);
        let div = doc.document_element().unwrap();
        let names: Vec<_> = doc.children(div).iter().filter_map(|&c| doc.tag_name(c)).collect();
        assert_eq!(names, ["p", "b"]);
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn test_remove_nested_matches() {
        assert_eq!(
            cleaned("<div><aside><aside>x</aside></aside><p>y</p></div>", |d, r| {
                remove_tags(d, r, &["aside"])
            }),
            "<div><p>y</p></div>"
        );
    }

    #[test]
    fn test_remove_tags_is_idempotent() {
        let mut doc = parse("<div><nav>n</nav><p>p</p></div>").unwrap();
        let root = doc.root();
        remove_tags(&mut doc, root, &["nav"]);
        let once = to_html_string(&doc, root, true);
        remove_tags(&mut doc, root, &["nav"]);
        assert_eq!(to_html_string(&doc, root, true), once);
    }

    #[test]
    fn test_remove_meta_and_styles() {
        assert_eq!(
            cleaned(
                r#"<div><meta name="a"><link rel="x"><style>p{}</style><p>k</p></div>"#,
                |d, r| {
                    remove_meta(d, r);
                    remove_styles(d, r)
                }
            ),
            "<div><p>k</p></div>"
        );
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = concat!(
            "<div>",
            r#"<p style="display:none">1</p>"#,
            r#"<p style="color:red; visibility: hidden">2</p>"#,
            r#"<p hidden>3</p>"#,
            r#"<p aria-hidden="true">4</p>"#,
            r#"<p aria-hidden="false">keep1</p>"#,
            r#"<p class="a hide">5</p>"#,
            r#"<p class="hidden-xs">keep2</p>"#,
            "</div>"
        );
        assert_eq!(
            cleaned(html, remove_hidden_elements),
            r#"<div><p aria-hidden="false">keep1</p><p class="hidden-xs">keep2</p></div>"#
        );
    }

    #[test]
    fn test_remove_comments() {
        assert_eq!(
            cleaned("<div><!-- a --><p>x<!-- b --></p></div>", remove_comments),
            "<div><p>x</p></div>"
        );
    }

    #[test]
    fn test_remove_attributes_allow_list() {
        let mut doc = parse(r#"<div class="c" id="d"><a href="x" onclick="y" data-foo="z" id="i">t</a></div>"#)
            .unwrap();
        let root = doc.root();
        remove_attributes(&mut doc, root, &AttributeFilter::default().allow(["id", "href", "data-*"]));
        assert_eq!(
            to_html_string(&doc, root, true),
            r#"<div id="d"><a href="x" data-foo="z" id="i">t</a></div>"#
        );
    }

    #[test]
    fn test_remove_attributes_deny_list() {
        let mut doc = parse(r#"<p onclick="a" onload="b" title="t">x</p>"#).unwrap();
        let root = doc.root();
        remove_attributes(&mut doc, root, &AttributeFilter::default().deny(["on*"]));
        assert_eq!(to_html_string(&doc, root, true), r#"<p title="t">x</p>"#);
    }

    #[test]
    fn test_remove_empty_nodes_bottom_up() {
        assert_eq!(
            cleaned("<div><p></p><span>  </span><img></div>", remove_empty_nodes),
            "<div><img></div>"
        );
        assert_eq!(
            cleaned("<section><div><p><b></b></p></div></section><p>x</p>", remove_empty_nodes),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_empty_node_with_comment_is_kept() {
        assert_eq!(
            cleaned("<div><!--c--></div>", remove_empty_nodes),
            "<div><!--c--></div>"
        );
    }

    #[test]
    fn test_complete_relative_links() {
        let mut doc = parse(
            r##"<a href="page.html">1</a><a href="https://x.org/">2</a><a href="#top">3</a><img src="/img/a.png">"##,
        )
        .unwrap();
        let root = doc.root();
        complete_relative_links(&mut doc, root, "http://site.test/base/");
        assert_eq!(
            to_html_string(&doc, root, true),
            r##"<a href="http://site.test/base/page.html">1</a><a href="https://x.org/">2</a><a href="#top">3</a><img src="http://site.test/base/img/a.png">"##
        );
    }
}
