//! Document Tree
//!
//! An owned, arena-backed HTML tree. Nodes live in a single `Vec` inside the
//! [`Document`] and are addressed by [`NodeId`]; every node stores an explicit
//! parent link next to its ordered child list.
//!
//! ## Mutation discipline
//!
//! Iterators such as [`Document::descendants`] borrow the document immutably,
//! while every mutation needs `&mut Document`. A deletion pass therefore has to
//! collect its targets into a `Vec<NodeId>` before detaching anything:
//!
//! ```rust
//! use html_scrub::parse;
//!
//! let mut doc = parse("<div><script>a</script><script>b</script><p>x</p></div>")?;
//! let root = doc.root();
//! let scripts: Vec<_> = doc
//!     .descendants(root)
//!     .filter(|&id| doc.tag_name(id) == Some("script"))
//!     .collect();
//! for id in scripts {
//!     doc.detach(id);
//! }
//! assert_eq!(html_scrub::to_html_string(&doc, root, true), "<div><p>x</p></div>");
//! # Ok::<(), html_scrub::Error>(())
//! ```

use encoding_rs::{Encoding, UTF_8};

/// Elements that never have content and are serialized without an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is written without escaping.
///
/// html5ever tokenizes these as raw text, so their text is stored unescaped.
/// `noscript` is not among them: `dom_query` parses with scripting disabled.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Check if a tag name is a void (self-closing) element.
#[inline]
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Check if a tag name holds raw, unescaped text.
#[inline]
#[must_use]
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Trim ASCII whitespace, vertical tab and NUL.
///
/// Non-breaking and other Unicode spaces are content and survive.
#[must_use]
pub fn trim_whitespace(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\x0B' || c == '\0')
}

/// Handle of a node inside its owning [`Document`].
///
/// Ids are never reused, so a detached node keeps its id (and its subtree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node inside the arena.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, case preserved as parsed.
    pub name: String,
    /// Attribute value (empty for boolean attributes).
    pub value: String,
}

/// Element payload: tag name plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attribute>,
}

impl Element {
    /// Create an element; the tag name is lowercased.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Lowercase tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, overwriting an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.attrs.iter_mut().find(|a| a.name == name) {
            value.clone_into(&mut existing.value);
        } else {
            self.attrs.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Remove an attribute, returning its value if it existed.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The synthetic root that owns the top-level nodes.
    Document,
    /// An element with attributes and children.
    Element(Element),
    /// A text node.
    Text(String),
    /// A comment node (value without the `<!--`/`-->` delimiters).
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An HTML document: the arena owning every node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    encoding: &'static Encoding,
    diagnostics: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            encoding: UTF_8,
            diagnostics: Vec::new(),
        }
    }

    /// The synthetic document root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Output encoding declared when the document was parsed.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    /// Non-fatal diagnostics collected while parsing: rewrites applied to the
    /// input and decode errors.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, message: String) {
        self.diagnostics.push(message);
    }

    /// Number of nodes ever allocated (attached or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists and it has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    // === Node creation ===

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.push(NodeData::Text(value.to_string()))
    }

    /// Allocate a detached comment node.
    pub fn create_comment(&mut self, value: &str) -> NodeId {
        self.push(NodeData::Comment(value.to_string()))
    }

    // === Node information ===

    /// Payload of a node.
    #[inline]
    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Element payload, if the node is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Lowercase tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element(_))
    }

    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    #[must_use]
    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Comment(_))
    }

    /// Value of a text or comment node.
    #[must_use]
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(v) | NodeData::Comment(v) => Some(v),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes (comments excluded).
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(v) = self.data(id) {
            out.push_str(v);
            return out;
        }
        for node in self.descendants(id) {
            if let NodeData::Text(v) = self.data(node) {
                out.push_str(v);
            }
        }
        out
    }

    // === Attributes ===

    /// Attributes of an element (empty slice for other nodes).
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map_or(&[], Element::attrs)
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute; no-op for non-elements.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    /// Remove an attribute; returns the removed value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|el| el.remove_attr(name))
    }

    // === Navigation ===

    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children in document order.
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children only.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.is_element(c))
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, pos))
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.index_in_parent(id)?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.index_in_parent(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    /// Siblings before the node, nearest first.
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.index_in_parent(id)
            .map(|(parent, pos)| self.children(parent)[..pos].iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// Siblings after the node, nearest first.
    #[must_use]
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.index_in_parent(id)
            .map(|(parent, pos)| self.children(parent)[pos + 1..].to_vec())
            .unwrap_or_default()
    }

    /// Ancestors, nearest first, ending at the document root when attached.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Descendants in document (pre-)order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// True if the node can be reached from the document root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    /// The single top-level element, if the document has exactly one.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        let mut elements = self.element_children(self.root());
        let first = elements.next()?;
        elements.next().is_none().then_some(first)
    }

    /// First descendant element with the given tag name.
    #[must_use]
    pub fn first_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(id).find(|&n| self.tag_name(n) == Some(tag))
    }

    // === Mutation ===

    /// Remove a node (and its subtree) from its parent.
    ///
    /// The node keeps its id and children, but is no longer attached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append a node as the last child of `parent`, detaching it first.
    ///
    /// # Panics
    ///
    /// Panics if `child` is `parent` or one of its ancestors, which would
    /// create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            child != parent && !self.ancestors(parent).any(|a| a == child),
            "append_child would create a cycle"
        );
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, value: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                existing.push_str(value);
                return;
            }
        }
        let text = self.create_text(value);
        self.append_child(parent, text);
    }
}

/// Iterator over ancestors, nearest first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("DIV");
        let p = doc.create_element("p");
        let span = doc.create_element("span");
        doc.append_child(root, div);
        doc.append_child(div, p);
        doc.append_child(div, span);
        doc.append_text(p, "hello ");
        doc.append_text(p, "world");
        (doc, div, p, span)
    }

    #[test]
    fn test_trim_whitespace_keeps_unicode_spaces() {
        assert_eq!(trim_whitespace(" \t\n\x0B\0 a \r\x0C"), "a");
        assert_eq!(trim_whitespace("\u{a0}a\u{3000}"), "\u{a0}a\u{3000}");
        assert!(is_raw_text_element("iframe"));
        assert!(!is_raw_text_element("noscript"));
    }

    #[test]
    fn test_tag_names_are_lowercased() {
        let (doc, div, _, _) = sample();
        assert_eq!(doc.tag_name(div), Some("div"));
    }

    #[test]
    fn test_append_text_merges_adjacent_text() {
        let (doc, _, p, _) = sample();
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "hello world");
    }

    #[test]
    fn test_detach_clears_both_links() {
        let (mut doc, div, p, span) = sample();
        doc.detach(p);

        assert_eq!(doc.parent(p), None);
        assert_eq!(doc.children(div), &[span]);
        assert!(!doc.is_attached(p));
        // subtree survives
        assert_eq!(doc.text_content(p), "hello world");
    }

    #[test]
    fn test_siblings() {
        let (doc, _, p, span) = sample();
        assert_eq!(doc.next_sibling(p), Some(span));
        assert_eq!(doc.prev_sibling(span), Some(p));
        assert_eq!(doc.prev_sibling(p), None);
        assert_eq!(doc.preceding_siblings(span), vec![p]);
        assert_eq!(doc.following_siblings(p), vec![span]);
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let (doc, div, p, span) = sample();
        let text = doc.children(p)[0];
        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![div, p, text, span]);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (doc, div, p, _) = sample();
        let text = doc.children(p)[0];
        let chain: Vec<_> = doc.ancestors(text).collect();
        assert_eq!(chain, vec![p, div, doc.root()]);
    }

    #[test]
    fn test_attributes_keep_order_and_last_write_wins() {
        let (mut doc, div, _, _) = sample();
        doc.set_attr(div, "id", "a");
        doc.set_attr(div, "class", "b");
        doc.set_attr(div, "id", "c");

        let names: Vec<_> = doc.attrs(div).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "class"]);
        assert_eq!(doc.attr(div, "id"), Some("c"));
        assert_eq!(doc.remove_attr(div, "id"), Some("c".to_string()));
        assert!(!doc.has_attr(div, "id"));
    }

    #[test]
    fn test_document_element_requires_single_top_level_element() {
        let (mut doc, div, _, _) = sample();
        assert_eq!(doc.document_element(), Some(div));

        let other = doc.create_element("p");
        let root = doc.root();
        doc.append_child(root, other);
        assert_eq!(doc.document_element(), None);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn test_append_child_rejects_cycles() {
        let (mut doc, div, p, _) = sample();
        doc.append_child(p, div);
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("img"));
        assert!(is_void_element("source"));
        assert!(!is_void_element("div"));
    }
}
