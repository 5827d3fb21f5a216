use html_scrub::selector::compile;
use html_scrub::xpath::XPath;
use html_scrub::{parse, query_selector, query_selector_all, Error};

#[test]
fn compound_selector_matches_exactly_one_span() {
    let doc = parse(r#"<div id="main"><span class="item" data-x="1">ok</span></div>"#)
        .expect("parse failed");
    let xpath = compile("#main .item[data-x=1]").expect("compile failed");
    let hits = XPath::parse(&xpath)
        .expect("compiled selector is valid XPath")
        .select_nodes(&doc, doc.root())
        .expect("evaluation failed");

    assert_eq!(hits.len(), 1);
    assert_eq!(doc.tag_name(hits[0]), Some("span"));
    assert_eq!(doc.text_content(hits[0]), "ok");
}

#[test]
fn class_selector_matches_whole_tokens_only() {
    let doc = parse(
        r#"<p class="item">1</p><p class="items">2</p><p class=" big  item ">3</p><p class="item-x">4</p>"#,
    )
    .expect("parse failed");
    let texts: Vec<String> = query_selector_all(&doc, doc.root(), ".item")
        .expect("query failed")
        .into_iter()
        .map(|n| doc.text_content(n))
        .collect();
    assert_eq!(texts, ["1", "3"]);
}

#[test]
fn attribute_operators_select_expected_links() {
    let doc = parse(
        r#"<a href="https://a.example/doc.pdf" lang="en-US">1</a>
           <a href="/local.html" lang="en">2</a>
           <a href="https://b.example/page" lang="fr">3</a>"#,
    )
    .expect("parse failed");
    let texts = |css: &str| -> Vec<String> {
        query_selector_all(&doc, doc.root(), css)
            .expect("query failed")
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    };

    assert_eq!(texts("a[href^=https]"), ["1", "3"]);
    assert_eq!(texts("a[href$='.pdf']"), ["1"]);
    assert_eq!(texts("a[href*=example]"), ["1", "3"]);
    assert_eq!(texts("a[lang|=en]"), ["1", "2"]);
    assert_eq!(texts("a[href^='']"), Vec::<String>::new());
    assert_eq!(texts("a[lang]"), ["1", "2", "3"]);
}

#[test]
fn selector_groups_return_document_order() {
    let doc = parse("<h2>b</h2><h1>a</h1><h3>c</h3>").expect("parse failed");
    let tags: Vec<&str> = query_selector_all(&doc, doc.root(), "h3, h1, h2")
        .expect("query failed")
        .into_iter()
        .filter_map(|n| doc.tag_name(n))
        .collect();
    assert_eq!(tags, ["h2", "h1", "h3"]);
}

#[test]
fn combinators_read_as_descendant() {
    let doc = parse("<div><p><span>x</span></p></div><ul><li>a</li></ul>").expect("parse failed");
    let hit = query_selector(&doc, doc.root(), "div > span").expect("query failed");
    assert!(hit.is_some());
    let hover = query_selector(&doc, doc.root(), "span:hover").expect("query failed");
    assert_eq!(hover, hit);

    let li = query_selector(&doc, doc.root(), "ul > li").expect("query failed");
    assert_eq!(li.and_then(|n| doc.tag_name(n)), Some("li"));
    assert_eq!(compile("ul>li").expect("compile failed"), "//ul//li");
}

#[test]
fn values_with_both_quote_kinds_round_trip() {
    let doc = parse(r#"<p title="it's &quot;quoted&quot;">x</p>"#).expect("parse failed");
    let literal = html_scrub::selector::xpath_literal(r#"it's "quoted""#);
    let xpath = format!("//p[@title={literal}]");
    let hits = XPath::parse(&xpath)
        .expect("valid XPath")
        .select_nodes(&doc, doc.root())
        .expect("evaluation failed");
    assert_eq!(hits.len(), 1);
}

#[test]
fn malformed_brackets_are_rejected() {
    let doc = parse("<p>x</p>").expect("parse failed");
    assert!(matches!(
        query_selector(&doc, doc.root(), "p[title"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(compile("p[title!=x]"), Err(Error::UnsupportedSelector(_))));
}
