//! XPath 1.0 over the document arena.
//!
//! Supports location paths on all axes except `namespace`, predicates
//! (positional and boolean), unions, the full operator set and the core
//! function library. Variables and processing-instruction tests are rejected.
//!
//! ```rust
//! use html_scrub::{parse, xpath::XPath};
//!
//! let doc = parse(r#"<ul><li>a</li><li class="x">b</li></ul>"#)?;
//! let hits = XPath::parse("//li[@class='x']")?.select_nodes(&doc, doc.root())?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(doc.text_content(hits[0]), "b");
//! # Ok::<(), html_scrub::Error>(())
//! ```

mod eval;
mod lexer;
mod parser;

use crate::dom::{Document, NodeData, NodeId};
use crate::error::{Error, Result};

/// A member of a node-set: a tree node or one attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XNode {
    Node(NodeId),
    /// Owner element and attribute index.
    Attribute(NodeId, usize),
}

impl XNode {
    /// The tree node, or the owner element for an attribute.
    #[must_use]
    pub fn node(self) -> NodeId {
        match self {
            XNode::Node(id) | XNode::Attribute(id, _) => id,
        }
    }

    /// String value: text content for nodes, the value for attributes.
    #[must_use]
    pub fn string_value(self, doc: &Document) -> String {
        match self {
            XNode::Attribute(owner, i) => doc.attrs(owner)[i].value.clone(),
            XNode::Node(id) => match doc.data(id) {
                NodeData::Text(v) | NodeData::Comment(v) => v.clone(),
                NodeData::Element(_) | NodeData::Document => doc.text_content(id),
            },
        }
    }
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<XNode>),
    Boolean(bool),
    Number(f64),
    String(String),
}

/// A compiled XPath expression.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    expr: parser::Expr,
}

impl XPath {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidXPath`] for syntax errors and unsupported
    /// constructs.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate with `context` as the context node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DetachedNode`] if `context` is not attached to the
    /// document, or [`Error::InvalidXPath`] for evaluation errors (unknown
    /// functions, wrong arity, node-set operations on other types).
    pub fn evaluate(&self, doc: &Document, context: NodeId) -> Result<Value> {
        if !doc.is_attached(context) {
            return Err(Error::DetachedNode);
        }
        eval::Evaluator::new(doc).evaluate(&self.expr, context)
    }

    /// Evaluate and require a node-set.
    ///
    /// # Errors
    ///
    /// As [`XPath::evaluate`], plus [`Error::InvalidXPath`] when the result is
    /// not a node-set.
    pub fn select(&self, doc: &Document, context: NodeId) -> Result<Vec<XNode>> {
        match self.evaluate(doc, context)? {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(Error::InvalidXPath(format!(
                "{} evaluates to {other:?}, not a node-set",
                self.source
            ))),
        }
    }

    /// Like [`XPath::select`], keeping only tree nodes.
    ///
    /// # Errors
    ///
    /// As [`XPath::select`].
    pub fn select_nodes(&self, doc: &Document, context: NodeId) -> Result<Vec<NodeId>> {
        Ok(self
            .select(doc, context)?
            .into_iter()
            .filter_map(|n| match n {
                XNode::Node(id) => Some(id),
                XNode::Attribute(..) => None,
            })
            .collect())
    }
}
