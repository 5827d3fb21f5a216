//! Read-only queries over a document.
//!
//! Structural fingerprints (depth, same-tag sibling position, tag path),
//! selector and XPath lookups, and value extraction. Nothing here mutates
//! the tree.

use crate::dom::{trim_whitespace, Attribute, Document, NodeData, NodeId};
use crate::error::Result;
use crate::selector;
use crate::xpath::{XNode, XPath};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Where to look for values: an XPath expression or a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    fn resolve(&self, doc: &Document, root: NodeId) -> Result<Vec<XNode>> {
        match self {
            Locator::XPath(xpath) => XPath::parse(xpath)?.select(doc, root),
            Locator::Css(css) => select_css(doc, root, css),
        }
    }
}

/// Strings starting with `/`, `./`, `..`, `(` or `@`, the string `.`, and
/// anything containing an axis separator `::` are XPath; the rest is CSS.
impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        let s = value.trim_start();
        let xpath = s == "."
            || s.starts_with('/')
            || s.starts_with("./")
            || s.starts_with("..")
            || s.starts_with('(')
            || s.starts_with('@')
            || s.contains("::");
        if xpath {
            Locator::XPath(value.to_string())
        } else {
            Locator::Css(value.to_string())
        }
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Locator::from(value.as_str())
    }
}

fn is_html_or_body(doc: &Document, id: NodeId) -> bool {
    matches!(doc.tag_name(id), Some("html" | "body"))
}

// === Attributes and fingerprints ===

/// Attributes of an element in source order; empty for other nodes.
#[must_use]
pub fn attributes(doc: &Document, node: NodeId) -> &[Attribute] {
    doc.attrs(node)
}

/// Element ancestors, nearest first.
///
/// With `exclude_html_body`, the walk stops at the first `html` or `body`
/// ancestor, which is not included.
#[must_use]
pub fn parents(doc: &Document, node: NodeId, exclude_html_body: bool) -> Vec<NodeId> {
    doc.ancestors(node)
        .take_while(|&a| doc.is_element(a) && !(exclude_html_body && is_html_or_body(doc, a)))
        .collect()
}

/// Number of element ancestors, under the same stopping rule as [`parents`].
#[must_use]
pub fn depth(doc: &Document, node: NodeId, exclude_html_body: bool) -> usize {
    parents(doc, node, exclude_html_body).len()
}

/// 1-based position among preceding siblings with the same tag name.
///
/// This is the XPath `tag[n]` index, not the child index.
#[must_use]
pub fn sibling_position(doc: &Document, node: NodeId) -> usize {
    let tag = doc.tag_name(node);
    doc.preceding_siblings(node)
        .into_iter()
        .filter(|&s| doc.is_element(s) && doc.tag_name(s) == tag)
        .count()
        + 1
}

fn step_label(doc: &Document, node: NodeId) -> String {
    format!(
        "{}[{}]",
        doc.tag_name(node).unwrap_or_default(),
        sibling_position(doc, node)
    )
}

/// `tag[n]` for each ancestor below `html`/`body`, outermost first.
#[must_use]
pub fn parent_tags(doc: &Document, node: NodeId) -> Vec<String> {
    let mut tags: Vec<String> = parents(doc, node, true)
        .into_iter()
        .map(|p| step_label(doc, p))
        .collect();
    tags.reverse();
    tags
}

/// [`parent_tags`] followed by the node's own `tag[n]`.
///
/// ```rust
/// use html_scrub::{parse, query};
///
/// let doc = parse("<ul><li>a</li><li>b</li></ul>")?;
/// let second = query::find(&doc, doc.root(), "//li[2]")?.unwrap();
/// assert_eq!(query::tag_path(&doc, second), ["ul[1]", "li[2]"]);
/// # Ok::<(), html_scrub::Error>(())
/// ```
#[must_use]
pub fn tag_path(doc: &Document, node: NodeId) -> Vec<String> {
    let mut tags = parent_tags(doc, node);
    tags.push(step_label(doc, node));
    tags
}

/// [`tag_path`] joined with `/`.
#[must_use]
pub fn tag_path_string(doc: &Document, node: NodeId) -> String {
    tag_path(doc, node).join("/")
}

/// True if `candidate` is a strict descendant of `ancestor`.
#[must_use]
pub fn contains(doc: &Document, ancestor: NodeId, candidate: NodeId) -> bool {
    ancestor != candidate && doc.ancestors(candidate).any(|a| a == ancestor)
}

// === Matching ===

/// True if `node` is an element selected by `xpath` evaluated with `node`
/// as the context node.
///
/// Absolute expressions (including every compiled selector) therefore test
/// membership in the document-wide result; `.` or `self::div` test the node
/// itself.
///
/// # Errors
///
/// Returns an XPath error, or [`Error::DetachedNode`](crate::Error::DetachedNode)
/// if `node` is not attached.
pub fn matches(doc: &Document, node: NodeId, xpath: &str) -> Result<bool> {
    if !doc.is_element(node) {
        return Ok(false);
    }
    let hits = XPath::parse(xpath)?.select(doc, node)?;
    Ok(hits.contains(&XNode::Node(node)))
}

/// The node itself or its nearest element ancestor matching a CSS selector.
///
/// # Errors
///
/// Returns a selector or XPath error, or
/// [`Error::DetachedNode`](crate::Error::DetachedNode).
pub fn closest(doc: &Document, node: NodeId, css: &str) -> Result<Option<NodeId>> {
    let xpath = XPath::parse(&selector::compile(css)?)?;
    let hits: HashSet<XNode> = xpath.select(doc, node)?.into_iter().collect();
    Ok(std::iter::once(node)
        .chain(doc.ancestors(node))
        .filter(|&n| doc.is_element(n))
        .find(|&n| hits.contains(&XNode::Node(n))))
}

// === Lookup ===

/// First node selected by `xpath` with `root` as the context node.
///
/// Attribute results are skipped; use [`read_value`] for those.
///
/// # Errors
///
/// Returns [`Error::InvalidXPath`](crate::Error::InvalidXPath) or
/// [`Error::DetachedNode`](crate::Error::DetachedNode).
pub fn find(doc: &Document, root: NodeId, xpath: &str) -> Result<Option<NodeId>> {
    Ok(find_all(doc, root, xpath)?.into_iter().next())
}

/// Every node selected by `xpath`, in document order.
///
/// # Errors
///
/// As [`find`].
pub fn find_all(doc: &Document, root: NodeId, xpath: &str) -> Result<Vec<NodeId>> {
    XPath::parse(xpath)?.select_nodes(doc, root)
}

fn select_css(doc: &Document, root: NodeId, css: &str) -> Result<Vec<XNode>> {
    let xpath = selector::compile(css)?;
    let self_only = xpath == ".";
    let hits = XPath::parse(&xpath)?.select(doc, root)?;
    Ok(hits
        .into_iter()
        .filter(|hit| {
            let n = hit.node();
            if self_only {
                n == root
            } else {
                contains(doc, root, n)
            }
        })
        .collect())
}

/// First descendant of `root` matching a CSS selector.
///
/// # Errors
///
/// Returns a selector or XPath error, or
/// [`Error::DetachedNode`](crate::Error::DetachedNode).
pub fn query_selector(doc: &Document, root: NodeId, css: &str) -> Result<Option<NodeId>> {
    Ok(query_selector_all(doc, root, css)?.into_iter().next())
}

/// Every descendant of `root` matching a CSS selector, in document order.
///
/// The empty selector selects `root` itself.
///
/// # Errors
///
/// As [`query_selector`].
pub fn query_selector_all(doc: &Document, root: NodeId, css: &str) -> Result<Vec<NodeId>> {
    Ok(select_css(doc, root, css)?
        .into_iter()
        .filter_map(|hit| match hit {
            XNode::Node(id) => Some(id),
            XNode::Attribute(..) => None,
        })
        .collect())
}

// === Values ===

/// Untrimmed value of a hit: text content of elements, the value of text,
/// comment and attribute nodes.
#[must_use]
pub fn value(doc: &Document, item: XNode) -> String {
    item.string_value(doc)
}

/// Trimmed value of the first match, or `None` when nothing matches.
///
/// ```rust
/// use html_scrub::{parse, query::read_value};
///
/// let doc = parse(r#"<h1> Title </h1><a href="/x">link</a>"#)?;
/// assert_eq!(read_value(&doc, doc.root(), "h1")?, Some("Title".to_string()));
/// assert_eq!(read_value(&doc, doc.root(), "//a/@href")?, Some("/x".to_string()));
/// assert_eq!(read_value(&doc, doc.root(), "h2")?, None);
/// # Ok::<(), html_scrub::Error>(())
/// ```
///
/// # Errors
///
/// Returns a selector or XPath error, or
/// [`Error::DetachedNode`](crate::Error::DetachedNode).
pub fn read_value(
    doc: &Document,
    root: NodeId,
    locator: impl Into<Locator>,
) -> Result<Option<String>> {
    let hits = locator.into().resolve(doc, root)?;
    Ok(hits.first().map(|&hit| trim_whitespace(&value(doc, hit)).to_string()))
}

/// Try each locator in order and return the first value found.
///
/// # Errors
///
/// As [`read_value`]; an erroring locator stops the search.
pub fn read_value_first<L>(doc: &Document, root: NodeId, locators: &[L]) -> Result<Option<String>>
where
    L: Clone + Into<Locator>,
{
    for locator in locators {
        if let Some(found) = read_value(doc, root, locator.clone())? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Trimmed values of every match, in document order.
///
/// # Errors
///
/// As [`read_value`].
pub fn read_values(doc: &Document, root: NodeId, locator: impl Into<Locator>) -> Result<Vec<String>> {
    read_values_with(doc, root, locator, |doc, hit| trim_whitespace(&value(doc, hit)).to_string())
}

/// Apply `transform` to every match, in document order.
///
/// # Errors
///
/// As [`read_value`].
pub fn read_values_with<T>(
    doc: &Document,
    root: NodeId,
    locator: impl Into<Locator>,
    mut transform: impl FnMut(&Document, XNode) -> T,
) -> Result<Vec<T>> {
    let hits = locator.into().resolve(doc, root)?;
    Ok(hits.into_iter().map(|hit| transform(doc, hit)).collect())
}

// === Traversal ===

/// The first `body` element, or the document root if there is none.
#[must_use]
pub fn body(doc: &Document) -> NodeId {
    doc.first_by_tag(doc.root(), "body").unwrap_or(doc.root())
}

/// Where to start a structural walk: the document element for the document
/// root, and `body` (or the first element child) in place of `html`.
fn walk_start(doc: &Document, root: NodeId) -> NodeId {
    let node = if root == doc.root() {
        doc.document_element().unwrap_or(root)
    } else {
        root
    };
    if doc.tag_name(node) == Some("html") {
        let body = doc
            .element_children(node)
            .find(|&c| doc.tag_name(c) == Some("body"));
        if let Some(next) = body.or_else(|| doc.element_children(node).next()) {
            return next;
        }
    }
    node
}

/// Position of a node in an [`each`] walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visit {
    pub depth: usize,
    /// Index among the parent's element children, from 0 (1 for the start).
    pub index: usize,
    /// Index among preceding same-tag element siblings, from 0 (1 for the start).
    pub sibling_index: usize,
}

/// Depth-first walk over elements from `root`, calling
/// `visitor(doc, node, visit, parent_visit)`.
///
/// For the document root the walk starts at the document element, and an
/// `html` element is replaced by its `body`.
pub fn each(doc: &Document, root: NodeId, mut visitor: impl FnMut(&Document, NodeId, Visit, Visit)) {
    fn walk(
        doc: &Document,
        node: NodeId,
        visit: Visit,
        parent: Visit,
        visitor: &mut impl FnMut(&Document, NodeId, Visit, Visit),
    ) {
        visitor(doc, node, visit, parent);
        let mut same_tag: HashMap<&str, usize> = HashMap::new();
        for (index, child) in doc.element_children(node).enumerate() {
            let counter = same_tag.entry(doc.tag_name(child).unwrap_or_default()).or_default();
            let child_visit = Visit {
                depth: visit.depth + 1,
                index,
                sibling_index: *counter,
            };
            *counter += 1;
            walk(doc, child, child_visit, visit, visitor);
        }
    }

    let start = Visit {
        depth: 0,
        index: 1,
        sibling_index: 1,
    };
    walk(doc, walk_start(doc, root), start, Visit::default(), &mut visitor);
}

/// Serializable structural dump of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    /// Tag name, or `#text` / `#comment`.
    pub tag: String,
    pub level: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Trimmed text, for text nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// Outline of the subtree under `root`, starting where [`each`] starts.
///
/// ```rust
/// use html_scrub::{parse, query::outline};
///
/// let doc = parse(r#"<div id="a"><p>hi</p></div>"#)?;
/// let tree = outline(&doc, doc.root());
/// assert_eq!(tree.tag, "div");
/// assert_eq!(tree.children[0].children[0].text.as_deref(), Some("hi"));
/// # Ok::<(), html_scrub::Error>(())
/// ```
#[must_use]
pub fn outline(doc: &Document, root: NodeId) -> OutlineNode {
    fn build(doc: &Document, node: NodeId, level: usize) -> OutlineNode {
        let (tag, text) = match doc.data(node) {
            NodeData::Element(el) => (el.name().to_string(), None),
            NodeData::Text(v) => ("#text".to_string(), Some(trim_whitespace(v).to_string())),
            NodeData::Comment(_) => ("#comment".to_string(), None),
            NodeData::Document => ("#document".to_string(), None),
        };
        OutlineNode {
            tag,
            level,
            attrs: doc
                .attrs(node)
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
            text,
            children: doc
                .children(node)
                .iter()
                .map(|&c| build(doc, c, level + 1))
                .collect(),
        }
    }

    build(doc, walk_start(doc, root), 0)
}
