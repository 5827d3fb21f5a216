use html_scrub::options::{AttributeFilter, DEFAULT_REMOVE_TAGS};
use html_scrub::{clean, CleanOptions, ParseOptions};

#[test]
fn options_default_values_are_sensible() {
    let options = CleanOptions::default();
    assert!(options.remove_meta);
    assert!(options.remove_styles);
    assert!(options.remove_scripts);
    assert!(options.remove_hidden_elements);
    assert!(options.remove_empty_nodes);
    assert!(options.remove_comments);
    assert!(options.compress_whitespace);
    assert_eq!(options.remove_tags, DEFAULT_REMOVE_TAGS);
    assert!(options.deny_attributes.is_empty());
    assert_eq!(ParseOptions::default().encoding, "UTF-8");
}

#[test]
fn options_struct_update_syntax_overrides_selected_fields_only() {
    let options = CleanOptions {
        remove_styles: false,
        remove_tags: vec!["table".to_string()],
        ..CleanOptions::default()
    };

    assert!(!options.remove_styles);
    assert!(options.remove_scripts);
    assert_eq!(options.remove_tags, ["table"]);
}

#[test]
fn clean_respects_non_default_options() {
    let html = r#"<div><style>p{}</style><table><tr><td>cell</td></tr></table><nav>menu</nav></div>"#;

    let options = CleanOptions {
        remove_styles: false,
        remove_tags: vec!["table".to_string()],
        ..CleanOptions::default()
    };
    let custom = clean(html, &options).expect("clean failed");
    assert!(custom.contains("<style>p{}</style>"));
    assert!(!custom.contains("cell"));
    assert!(custom.contains("<nav>menu</nav>"));

    let default = clean(html, &CleanOptions::default()).expect("clean failed");
    assert!(!default.contains("<style>"));
    assert!(default.contains("cell"));
    assert!(!default.contains("menu"));
}

#[test]
fn attribute_filter_globs() {
    let filter = AttributeFilter::default().allow(["aria-*", "*-id", "href"]);
    assert!(filter.keeps("aria-label"));
    assert!(filter.keeps("data-id"));
    assert!(filter.keeps("href"));
    assert!(!filter.keeps("hreflang"));
    assert!(!filter.keeps("style"));
}
