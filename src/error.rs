//! Error types for html-scrub.
//!
//! Parsing, selector compilation and XPath evaluation are the only fallible
//! operations. Tree mutators and serializers never fail.

/// Error type for parsing and querying operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The HTML loader could not produce any tree.
    ///
    /// Carries the diagnostics collected while trying.
    #[error("HTML parsing failed: {}", .0.join("; "))]
    ParseError(Vec<String>),

    /// A query was run against a node that is no longer reachable from its
    /// document root.
    #[error("node is detached from its document")]
    DetachedNode,

    /// Selector syntax that is rejected instead of degraded to a wildcard.
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),

    /// XPath expression could not be parsed or evaluated.
    #[error("invalid XPath expression: {0}")]
    InvalidXPath(String),
}

/// Result type alias for parsing and querying operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_lists_every_diagnostic() {
        let err = Error::ParseError(vec!["empty document".into(), "no root".into()]);
        assert_eq!(err.to_string(), "HTML parsing failed: empty document; no root");
    }

    #[test]
    fn selector_error_names_the_input() {
        let err = Error::UnsupportedSelector("[=x]".into());
        assert!(err.to_string().contains("[=x]"));
    }
}
