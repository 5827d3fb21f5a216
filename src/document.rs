//! A parsed document with a "main node" that later operations default to.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::html_processing;
use crate::parser::parse;
use crate::query;
use crate::serialize;
use std::fmt;

/// Owns a [`Document`] and remembers which subtree is of interest.
///
/// ```rust
/// use html_scrub::HtmlDocument;
///
/// let mut page = HtmlDocument::new(
///     "<div><nav>menu</nav><article><p>story</p><!--ad--></article></div>",
/// )?;
/// page.query_selector_try_set_main_node(&["main", "article"])?;
/// page.remove_tags(&["nav"]).remove_comments();
/// assert_eq!(page.to_string(), "<article><p>story</p></article>");
/// # Ok::<(), html_scrub::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    doc: Document,
    main_node: Option<NodeId>,
}

impl HtmlDocument {
    /// Parse `html` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`](crate::Error::ParseError) for blank input.
    pub fn new(html: &str) -> Result<Self> {
        Ok(Self::from_document(parse(html)?))
    }

    #[must_use]
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            main_node: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// The node set with [`set_main_node`](Self::set_main_node) while it is
    /// still attached, else the single top-level element, else the root.
    #[must_use]
    pub fn main_node(&self) -> NodeId {
        self.main_node
            .filter(|&node| self.doc.is_attached(node))
            .or_else(|| self.doc.document_element())
            .unwrap_or_else(|| self.doc.root())
    }

    pub fn set_main_node(&mut self, node: NodeId) -> &mut Self {
        self.main_node = Some(node);
        self
    }

    /// Use the first match of the first XPath that matches anything.
    ///
    /// Returns whether the main node was set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidXPath`](crate::Error::InvalidXPath) for a
    /// malformed expression reached before a match.
    pub fn find_try_set_main_node<S: AsRef<str>>(&mut self, xpaths: &[S]) -> Result<bool> {
        for xpath in xpaths {
            if let Some(node) = self.find(xpath.as_ref())? {
                self.main_node = Some(node);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Use the first match of the first CSS selector that matches anything.
    ///
    /// Returns whether the main node was set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSelector`](crate::Error::UnsupportedSelector)
    /// for a malformed selector reached before a match.
    pub fn query_selector_try_set_main_node<S: AsRef<str>>(&mut self, selectors: &[S]) -> Result<bool> {
        for selector in selectors {
            if let Some(node) = self.query_selector(selector.as_ref())? {
                self.main_node = Some(node);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove `tags` anywhere in the document.
    pub fn remove_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> &mut Self {
        let root = self.doc.root();
        html_processing::remove_tags(&mut self.doc, root, tags);
        self
    }

    /// Prune empty elements under the main node.
    pub fn remove_empty_nodes(&mut self) -> &mut Self {
        let main = self.main_node();
        html_processing::remove_empty_nodes(&mut self.doc, main);
        self
    }

    /// Remove comments under the main node.
    pub fn remove_comments(&mut self) -> &mut Self {
        let main = self.main_node();
        html_processing::remove_comments(&mut self.doc, main);
        self
    }

    /// # Errors
    ///
    /// See [`query::find`].
    pub fn find(&self, xpath: &str) -> Result<Option<NodeId>> {
        query::find(&self.doc, self.doc.root(), xpath)
    }

    /// # Errors
    ///
    /// See [`query::find_all`].
    pub fn find_all(&self, xpath: &str) -> Result<Vec<NodeId>> {
        query::find_all(&self.doc, self.doc.root(), xpath)
    }

    /// # Errors
    ///
    /// See [`query::query_selector`].
    pub fn query_selector(&self, css: &str) -> Result<Option<NodeId>> {
        query::query_selector(&self.doc, self.doc.root(), css)
    }

    /// # Errors
    ///
    /// See [`query::query_selector_all`].
    pub fn query_selector_all(&self, css: &str) -> Result<Vec<NodeId>> {
        query::query_selector_all(&self.doc, self.doc.root(), css)
    }

    /// Serialize `node`, or the main node when `None`.
    #[must_use]
    pub fn to_html_string(&self, node: Option<NodeId>, compress: bool) -> String {
        serialize::to_html_string(&self.doc, node.unwrap_or_else(|| self.main_node()), compress)
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html_string(None, true))
    }
}
