//! Glob matching for attribute names.
//!
//! Patterns use `*` as a zero-or-more wildcard (`data-*`); everything else is
//! literal. A candidate matches a pattern list if any pattern matches it.

use regex::Regex;

/// A compiled list of glob patterns.
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

#[derive(Debug, Clone)]
enum Pattern {
    Exact(String),
    Wildcard(Regex),
}

impl GlobSet {
    /// Compile a list of patterns.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| compile(p.as_ref()))
            .collect();
        Self { patterns }
    }

    /// True if any pattern matches the whole candidate.
    #[must_use]
    pub fn is_match(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| match p {
            Pattern::Exact(s) => s == candidate,
            Pattern::Wildcard(re) => re.is_match(candidate),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(pattern: &str) -> Option<Pattern> {
    if !pattern.contains('*') {
        return Some(Pattern::Exact(pattern.to_string()));
    }
    let body = regex::escape(pattern).replace(r"\*", ".*");
    // escaped input only fails to compile past the size limit
    Regex::new(&format!(r"^{body}\z")).ok().map(Pattern::Wildcard)
}

/// Check a candidate against a list of glob patterns.
///
/// An empty pattern list never matches.
///
/// # Example
///
/// ```rust
/// use html_scrub::glob::matches_glob;
///
/// assert!(matches_glob(&["id", "data-*"], "data-foo"));
/// assert!(!matches_glob(&["id", "data-*"], "onclick"));
/// ```
#[must_use]
pub fn matches_glob<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    GlobSet::new(patterns).is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_patterns() {
        assert!(matches_glob(&["href"], "href"));
        assert!(!matches_glob(&["href"], "hreflang"));
    }

    #[test]
    fn test_wildcard_prefix_and_infix() {
        assert!(matches_glob(&["data-*"], "data-"));
        assert!(matches_glob(&["data-*"], "data-x-y"));
        assert!(matches_glob(&["aria-*-by"], "aria-labelled-by"));
        assert!(!matches_glob(&["data-*"], "xdata-foo"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches_glob(&["a.b"], "a.b"));
        assert!(!matches_glob(&["a.*"], "ab"));
        assert!(matches_glob(&["a.*"], "a.b"));
    }

    #[test]
    fn test_empty_list_never_matches() {
        let empty: [&str; 0] = [];
        assert!(!matches_glob(&empty, "id"));
        assert!(GlobSet::new(empty).is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches_glob(&["ID"], "id"));
    }
}
