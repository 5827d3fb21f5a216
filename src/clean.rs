//! The cleaning pipeline: parse, run the mutators in a fixed order, serialize.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::html_processing::{
    remove_attributes, remove_comments, remove_empty_nodes, remove_hidden_elements, remove_meta,
    remove_scripts, remove_styles, remove_tags,
};
use crate::options::CleanOptions;
use crate::parser::parse;
use crate::serialize::to_html_string;

/// Clean an HTML string and serialize the result.
///
/// Output is compressed unless `options.compress_whitespace` is `false`.
///
/// ```rust
/// use html_scrub::{clean, CleanOptions};
///
/// let html = r#"<div><script>track()</script><p class="x" id="k">  Hi  </p><span></span></div>"#;
/// assert_eq!(clean(html, &CleanOptions::default())?, r#"<div><p id="k"> Hi </p></div>"#);
/// # Ok::<(), html_scrub::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::ParseError`](crate::Error::ParseError) for blank input.
pub fn clean(html: &str, options: &CleanOptions) -> Result<String> {
    let doc = clean_document(html, options)?;
    Ok(to_html_string(&doc, doc.root(), options.compress_whitespace))
}

/// Clean an HTML string and return the tree for further querying.
///
/// # Errors
///
/// Returns [`Error::ParseError`](crate::Error::ParseError) for blank input.
pub fn clean_document(html: &str, options: &CleanOptions) -> Result<Document> {
    let mut doc = parse(html)?;
    let root = doc.root();
    apply(&mut doc, root, options);
    Ok(doc)
}

/// Clean a copy of the subtree at `node` as a new document.
///
/// The subtree is serialized and parsed again, so `doc` is left untouched.
///
/// # Errors
///
/// Returns [`Error::ParseError`](crate::Error::ParseError) when the subtree
/// serializes to blank markup.
pub fn clean_node(doc: &Document, node: NodeId, options: &CleanOptions) -> Result<Document> {
    clean_document(&to_html_string(doc, node, true), options)
}

/// Run the enabled cleaning steps on the subtree at `root`.
///
/// Order: meta, styles, scripts, tag list, hidden elements, empty nodes,
/// attributes, comments. Empty tag and attribute lists skip their step.
pub fn apply(doc: &mut Document, root: NodeId, options: &CleanOptions) -> NodeId {
    let before = doc.descendants(root).count();

    if options.remove_meta {
        remove_meta(doc, root);
    }
    if options.remove_styles {
        remove_styles(doc, root);
    }
    if options.remove_scripts {
        remove_scripts(doc, root);
    }
    if !options.remove_tags.is_empty() {
        remove_tags(doc, root, &options.remove_tags);
    }
    if options.remove_hidden_elements {
        remove_hidden_elements(doc, root);
    }
    if options.remove_empty_nodes {
        remove_empty_nodes(doc, root);
    }
    if let Some(filter) = options.attribute_filter() {
        remove_attributes(doc, root, &filter);
    }
    if options.remove_comments {
        remove_comments(doc, root);
    }

    log::debug!(
        "cleaned subtree: {before} -> {} node(s)",
        doc.descendants(root).count()
    );
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><body><script>x</script><!-- c --><div style="display:none">h</div><p id="k" onclick="j">  Hello   World  </p></body></html>"#;

    #[test]
    fn test_clean_sample_document() {
        let html = clean(SAMPLE, &CleanOptions::default()).unwrap();
        assert!(html.contains(r#"<p id="k"> Hello World </p>"#), "{html}");
        assert!(!html.contains("script"));
        assert!(!html.contains("<!--"));
        assert!(!html.contains("onclick"));
        assert!(!html.contains(">h<"));
    }

    #[test]
    fn test_disabled_steps_keep_content() {
        let options = CleanOptions {
            remove_scripts: false,
            remove_comments: false,
            remove_hidden_elements: false,
            remove_empty_nodes: false,
            allow_attributes: Vec::new(),
            ..CleanOptions::default()
        };
        let html = clean(SAMPLE, &options).unwrap();
        assert!(html.contains("<script>x</script>"));
        assert!(html.contains("<!-- c -->"));
        assert!(html.contains(r#"<div style="display:none">h</div>"#));
        assert!(html.contains(r#"onclick="j""#));
        assert!(html.starts_with("<html><body><script>"));
    }

    #[test]
    fn test_hidden_removal_runs_before_empty_pruning() {
        let html = clean(
            r#"<section><div hidden>x</div></section><p>keep</p>"#,
            &CleanOptions::default(),
        )
        .unwrap();
        assert_eq!(html, "<p>keep</p>");
    }

    #[test]
    fn test_comment_only_element_survives_empty_pruning() {
        let options = CleanOptions {
            remove_comments: false,
            ..CleanOptions::default()
        };
        assert_eq!(
            clean("<div><!--c--></div>", &options).unwrap(),
            "<div><!--c--></div>"
        );
    }

    #[test]
    fn test_default_tag_list() {
        let html = clean(
            "<header>h</header><nav>n</nav><main><p>body</p><ad>x</ad></main><footer>f</footer>",
            &CleanOptions::default(),
        )
        .unwrap();
        assert_eq!(html, "<main><p>body</p></main>");
    }

    #[test]
    fn test_beautified_output() {
        let options = CleanOptions {
            compress_whitespace: false,
            ..CleanOptions::default()
        };
        assert_eq!(
            clean("<div><p>a</p></div>", &options).unwrap(),
            "<div>\n\t<p>\n\t\ta\n\t</p>\n</div>"
        );
    }

    #[test]
    fn test_clean_node_leaves_source_untouched() {
        let doc = parse(r#"<div><section id="s"><script>x</script><p>t</p></section></div>"#).unwrap();
        let section = crate::find(&doc, doc.root(), "//section").unwrap().unwrap();
        let cleaned = clean_node(&doc, section, &CleanOptions::default()).unwrap();
        assert_eq!(
            to_html_string(&cleaned, cleaned.root(), true),
            r#"<section id="s"><p>t</p></section>"#
        );
        assert!(crate::find(&doc, doc.root(), "//script").unwrap().is_some());
    }

    #[test]
    fn test_blank_input_fails() {
        assert!(clean("  ", &CleanOptions::default()).is_err());
    }
}
