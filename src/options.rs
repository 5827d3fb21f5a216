//! Configuration for parsing and cleaning.
//!
//! `CleanOptions` controls which steps of the cleaning pipeline run, and with
//! which tag and attribute lists. `ParseOptions` carries the declared document
//! encoding.

use crate::glob::GlobSet;

/// Tags removed by default: page chrome and embedded content.
pub const DEFAULT_REMOVE_TAGS: &[&str] = &[
    "header",
    "footer",
    "nav",
    "aside",
    "svg",
    "noscript",
    "iframe",
    "frame",
    "advertisement",
    "ad",
];

/// Attributes kept by default. Entries may use `*` as a wildcard.
pub const DEFAULT_ALLOW_ATTRIBUTES: &[&str] = &["id", "name", "src", "href", "alt", "data-*"];

/// Options for the document parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Encoding label (WHATWG names such as `UTF-8`, `GBK`, `windows-1252`).
    ///
    /// For string input this is the output encoding recorded on the document.
    /// For byte input it is the fallback when the bytes carry no BOM or
    /// `<meta>` charset declaration.
    ///
    /// Default: `"UTF-8"`
    pub encoding: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
        }
    }
}

/// Options for [`clean`](crate::clean).
///
/// All fields are public. Use `Default::default()` for the standard pipeline.
///
/// # Example
///
/// ```rust
/// use html_scrub::CleanOptions;
///
/// let options = CleanOptions {
///     remove_comments: false,
///     allow_attributes: vec!["href".into(), "class".into()],
///     ..CleanOptions::default()
/// };
/// assert!(options.remove_scripts);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CleanOptions {
    /// Remove `<meta>` and `<link>`.
    ///
    /// Default: `true`
    pub remove_meta: bool,

    /// Remove `<style>`.
    ///
    /// Default: `true`
    pub remove_styles: bool,

    /// Remove `<script>`.
    ///
    /// Default: `true`
    pub remove_scripts: bool,

    /// Extra tags to remove with their subtrees. An empty list skips the step.
    ///
    /// Default: [`DEFAULT_REMOVE_TAGS`]
    pub remove_tags: Vec<String>,

    /// Remove elements hidden by inline style, `hidden`, `aria-hidden="true"`
    /// or a `hidden`/`hide` class.
    ///
    /// Default: `true`
    pub remove_hidden_elements: bool,

    /// Prune elements left without content, bottom-up.
    ///
    /// Default: `true`
    pub remove_empty_nodes: bool,

    /// Attribute names to keep (glob patterns). An empty list keeps all.
    ///
    /// Default: [`DEFAULT_ALLOW_ATTRIBUTES`]
    pub allow_attributes: Vec<String>,

    /// Attribute names to drop (glob patterns), applied after the allow list.
    ///
    /// Default: empty
    pub deny_attributes: Vec<String>,

    /// Remove comment nodes.
    ///
    /// Default: `true`
    pub remove_comments: bool,

    /// Serialize compressed on one line; `false` beautifies instead.
    ///
    /// Default: `true`
    pub compress_whitespace: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            remove_meta: true,
            remove_styles: true,
            remove_scripts: true,
            remove_tags: DEFAULT_REMOVE_TAGS.iter().map(ToString::to_string).collect(),
            remove_hidden_elements: true,
            remove_empty_nodes: true,
            allow_attributes: DEFAULT_ALLOW_ATTRIBUTES
                .iter()
                .map(ToString::to_string)
                .collect(),
            deny_attributes: Vec::new(),
            remove_comments: true,
            compress_whitespace: true,
        }
    }
}

impl CleanOptions {
    /// The attribute filter described by `allow_attributes` and
    /// `deny_attributes`, or `None` when both lists are empty.
    #[must_use]
    pub fn attribute_filter(&self) -> Option<AttributeFilter> {
        let mut filter = AttributeFilter::default();
        if !self.allow_attributes.is_empty() {
            filter = filter.allow(&self.allow_attributes);
        }
        if !self.deny_attributes.is_empty() {
            filter = filter.deny(&self.deny_attributes);
        }
        (!filter.is_noop()).then_some(filter)
    }
}

/// Allow/deny lists for [`remove_attributes`](crate::html_processing::remove_attributes).
///
/// When both lists are set, attributes outside the allow list are removed
/// first, then attributes matching the deny list.
///
/// ```rust
/// use html_scrub::options::AttributeFilter;
///
/// let filter = AttributeFilter::default().allow(["id", "data-*"]).deny(["data-secret"]);
/// assert!(filter.keeps("data-user"));
/// assert!(!filter.keeps("data-secret"));
/// assert!(!filter.keeps("onclick"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    allow: Option<GlobSet>,
    deny: Option<GlobSet>,
}

impl AttributeFilter {
    /// Keep only attributes matching one of `patterns`.
    #[must_use]
    pub fn allow<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow = Some(GlobSet::new(patterns));
        self
    }

    /// Drop attributes matching one of `patterns`.
    #[must_use]
    pub fn deny<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deny = Some(GlobSet::new(patterns));
        self
    }

    /// Whether an attribute with this name survives the filter.
    #[must_use]
    pub fn keeps(&self, name: &str) -> bool {
        if let Some(allow) = &self.allow {
            if !allow.is_match(name) {
                return false;
            }
        }
        self.deny.as_ref().is_none_or(|deny| !deny.is_match(name))
    }

    fn is_noop(&self) -> bool {
        self.allow.is_none() && self.deny.is_none()
    }
}
