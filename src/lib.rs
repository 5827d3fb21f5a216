//! # html-scrub
//!
//! HTML cleaning and structural querying.
//!
//! This library parses loosely-formed HTML into an owned tree, strips noise
//! (scripts, styles, comments, hidden elements, boilerplate tags, disallowed
//! attributes, empty nodes), locates content with CSS selectors or XPath, and
//! serializes the result compressed or beautified.
//!
//! ## Quick Start
//!
//! ```rust
//! use html_scrub::{clean, CleanOptions};
//!
//! let html = r#"<div><script>x()</script><p id="k" onclick="j">  Hello   World  </p></div>"#;
//! let cleaned = clean(html, &CleanOptions::default())?;
//! assert_eq!(cleaned, r#"<div><p id="k"> Hello World </p></div>"#);
//! # Ok::<(), html_scrub::Error>(())
//! ```
//!
//! ## Querying
//!
//! ```rust
//! use html_scrub::{parse, query, query_selector, read_value};
//!
//! let doc = parse(r#"<ul><li>a</li><li><a href="/b">b</a></li></ul>"#)?;
//! let link = query_selector(&doc, doc.root(), "li a")?.unwrap();
//! assert_eq!(query::tag_path_string(&doc, link), "ul[1]/li[2]/a[1]");
//! assert_eq!(read_value(&doc, doc.root(), "//a/@href")?.as_deref(), Some("/b"));
//! # Ok::<(), html_scrub::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Tolerant parsing**: html5ever via `dom_query`, with charset detection
//!   for byte input
//! - **Cleaning pipeline**: fixed-order mutators configured by [`CleanOptions`]
//! - **Selectors**: a CSS subset compiled to XPath, and an XPath 1.0 engine
//! - **Fingerprints**: depth, same-tag sibling position and tag paths

mod error;
mod parser;

/// Arena-backed document tree.
pub mod dom;

/// Glob matching for attribute allow/deny lists.
pub mod glob;

/// XPath 1.0 parser and evaluator.
pub mod xpath;

/// CSS selector to XPath compilation.
pub mod selector;

/// Read-only queries and structural fingerprints.
pub mod query;

/// In-place tree mutators.
pub mod html_processing;

/// Tree serialization, whitespace compression and beautifying.
pub mod serialize;

/// Parse and clean options.
pub mod options;

/// The cleaning pipeline.
pub mod clean;

/// Stateful document wrapper with a main node.
pub mod document;

/// Character encoding detection and transcoding.
pub mod encoding;

// Public API - re-exports
pub use clean::{clean, clean_document};
pub use document::HtmlDocument;
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use options::{CleanOptions, ParseOptions};
pub use parser::{parse, parse_bytes, parse_with_options};
pub use query::{find, find_all, query_selector, query_selector_all, read_value, read_values};
pub use serialize::to_html_string;
