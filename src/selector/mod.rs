//! CSS selector to XPath translation.
//!
//! Supports a practical subset: selector groups (`a, b`), the descendant
//! combinator (whitespace), and compounds built from a tag name or `*`, `#id`,
//! `.class` and attribute brackets with `=`, `~=`, `|=`, `^=`, `$=` and `*=`.
//!
//! Anything else degrades instead of failing. The combinators `>`, `+` and
//! `~` separate compounds like whitespace does, so `ul > li` reads as
//! `ul li`. A compound that starts with an unknown construct becomes `//*`,
//! and an unknown tail (`a:hover`) contributes no condition. Only malformed
//! attribute brackets are rejected.
//!
//! # Example
//!
//! ```rust
//! use html_scrub::selector::compile;
//!
//! assert_eq!(compile("")?, ".");
//! assert_eq!(compile("*")?, "//*");
//! assert_eq!(compile("ul li, p")?, "//ul//li | //p");
//! assert_eq!(compile("a[href^=http]")?, "//a[starts-with(@href, 'http')]");
//! # Ok::<(), html_scrub::Error>(())
//! ```

use crate::error::{Error, Result};

/// Compile a CSS selector into an XPath 1.0 expression.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSelector`] for an attribute bracket with no
/// closing `]`, an empty attribute name, an unknown operator or an
/// unterminated quoted value.
pub fn compile(selector: &str) -> Result<String> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Ok(".".to_string());
    }
    if selector == "*" {
        return Ok("//*".to_string());
    }

    let mut groups = Vec::new();
    for group in split_outside_brackets(selector, |c| c == ',') {
        let mut xpath = String::new();
        for compound in split_outside_brackets(group, is_combinator) {
            xpath.push_str(&compile_compound(compound)?);
        }
        if !xpath.is_empty() {
            groups.push(xpath);
        }
    }

    if groups.is_empty() {
        return Ok(".".to_string());
    }
    let xpath = groups.join(" | ");
    log::trace!("selector {selector:?} -> {xpath}");
    Ok(xpath)
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escapes, so a value containing both quote kinds is
/// assembled with `concat()`.
///
/// ```rust
/// use html_scrub::selector::xpath_literal;
///
/// assert_eq!(xpath_literal("it's"), r#""it's""#);
/// assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a', "'", 'b"c')"#);
/// ```
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Split on `is_separator`, ignoring separators inside `[...]`, `(...)` and
/// quotes. Empty pieces are dropped.
fn split_outside_brackets(input: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' if depth > 0 => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                c if depth == 0 && is_separator(c) => {
                    pieces.push(&input[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    pieces.push(&input[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_combinator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '>' | '+' | '~')
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_') || !c.is_ascii()
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(input.len(), |(i, _)| i);
    input.split_at(end)
}

/// One compound selector: `tag#id.class[attr=v]...` as a `//tag[...]` step.
fn compile_compound(compound: &str) -> Result<String> {
    let (tag, mut rest) = if let Some(rest) = compound.strip_prefix('*') {
        ("*".to_string(), rest)
    } else {
        let (name, rest) = take_ident(compound);
        if name.is_empty() {
            ("*".to_string(), rest)
        } else {
            (name.to_ascii_lowercase(), rest)
        }
    };

    let mut predicates = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix('#') {
            let (id, tail) = take_ident(after);
            if id.is_empty() {
                break;
            }
            predicates.push(format!("@id={}", xpath_literal(id)));
            rest = tail;
        } else if let Some(after) = rest.strip_prefix('.') {
            let (class, tail) = take_ident(after);
            if class.is_empty() {
                break;
            }
            predicates.push(token_predicate("class", class));
            rest = tail;
        } else if let Some(after) = rest.strip_prefix('[') {
            let (predicate, tail) = compile_attribute(after, compound)?;
            predicates.push(predicate);
            rest = tail;
        } else {
            break;
        }
    }

    if !rest.is_empty() {
        log::trace!("selector fragment {rest:?} of {compound:?} ignored");
    }

    let mut xpath = format!("//{tag}");
    for predicate in predicates {
        xpath.push('[');
        xpath.push_str(&predicate);
        xpath.push(']');
    }
    Ok(xpath)
}

/// `[attr]`, `[attr op value]` after the opening bracket.
///
/// Returns the predicate and the input following the closing bracket.
fn compile_attribute<'a>(input: &'a str, compound: &str) -> Result<(String, &'a str)> {
    let unsupported = |reason: &str| Error::UnsupportedSelector(format!("{reason} in {compound:?}"));

    let input = input.trim_start();
    let name_end = input
        .char_indices()
        .find(|&(_, c)| !(is_ident_char(c) || c == ':'))
        .map_or(input.len(), |(i, _)| i);
    let (name, rest) = input.split_at(name_end);
    if name.is_empty() {
        return Err(unsupported("empty attribute name"));
    }
    let rest = rest.trim_start();

    if let Some(tail) = rest.strip_prefix(']') {
        return Ok((format!("@{name}"), tail));
    }
    if rest.is_empty() {
        return Err(unsupported("missing ']'"));
    }

    let operator = ["=", "~=", "|=", "^=", "$=", "*="]
        .into_iter()
        .find(|op| rest.starts_with(op))
        .ok_or_else(|| unsupported("unknown attribute operator"))?;
    let rest = rest[operator.len()..].trim_start();

    let (value, rest) = match rest.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &rest[1..];
            let close = body.find(q).ok_or_else(|| unsupported("unterminated quote"))?;
            (&body[..close], &body[close + 1..])
        }
        _ => {
            let end = rest
                .find(|c: char| c == ']' || c.is_whitespace())
                .unwrap_or(rest.len());
            rest.split_at(end)
        }
    };
    let tail = rest
        .trim_start()
        .strip_prefix(']')
        .ok_or_else(|| unsupported("missing ']'"))?;

    let attr = format!("@{name}");
    let literal = xpath_literal(value);
    let predicate = match operator {
        "=" => format!("{attr}={literal}"),
        "~=" => token_predicate(name, value),
        "|=" => format!(
            "{attr}={literal} or starts-with({attr}, {})",
            xpath_literal(&format!("{value}-"))
        ),
        // an empty prefix, suffix or substring never matches
        _ if value.is_empty() => "false()".to_string(),
        "^=" => format!("starts-with({attr}, {literal})"),
        "$=" => format!(
            "substring({attr}, string-length({attr}) - {})={literal}",
            value.chars().count() - 1
        ),
        _ => format!("contains({attr}, {literal})"),
    };
    Ok((predicate, tail))
}

/// Whitespace-separated token test, as used by `.class` and `~=`.
fn token_predicate(attr: &str, token: &str) -> String {
    format!(
        "contains(concat(' ', normalize-space(@{attr}), ' '), {})",
        xpath_literal(&format!(" {token} "))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_cases() {
        assert_eq!(compile("").unwrap(), ".");
        assert_eq!(compile("   ").unwrap(), ".");
        assert_eq!(compile("*").unwrap(), "//*");
    }

    #[test]
    fn test_id_and_class() {
        assert_eq!(compile("#main").unwrap(), "//*[@id='main']");
        assert_eq!(
            compile("p.lead").unwrap(),
            "//p[contains(concat(' ', normalize-space(@class), ' '), ' lead ')]"
        );
    }

    #[test]
    fn test_descendants_and_groups() {
        assert_eq!(compile("div  span").unwrap(), "//div//span");
        assert_eq!(compile("h1,h2 , h3").unwrap(), "//h1 | //h2 | //h3");
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(compile("[title]").unwrap(), "//*[@title]");
        assert_eq!(compile("input[type=\"text\"]").unwrap(), "//input[@type='text']");
        assert_eq!(
            compile("[lang|=en]").unwrap(),
            "//*[@lang='en' or starts-with(@lang, 'en-')]"
        );
        assert_eq!(
            compile("a[href$='.pdf']").unwrap(),
            "//a[substring(@href, string-length(@href) - 3)='.pdf']"
        );
        assert_eq!(compile("a[href*=x]").unwrap(), "//a[contains(@href, 'x')]");
        assert_eq!(
            compile("[rel~=nofollow]").unwrap(),
            "//*[contains(concat(' ', normalize-space(@rel), ' '), ' nofollow ')]"
        );
    }

    #[test]
    fn test_spaces_inside_brackets_do_not_split() {
        assert_eq!(
            compile("a[title = 'two words']").unwrap(),
            "//a[@title='two words']"
        );
    }

    #[test]
    fn test_commas_inside_quotes_do_not_split() {
        assert_eq!(compile("[data-x='a,b']").unwrap(), "//*[@data-x='a,b']");
    }

    #[test]
    fn test_tags_are_lowercased() {
        assert_eq!(compile("DIV").unwrap(), "//div");
    }

    #[test]
    fn test_unknown_fragments_degrade() {
        assert_eq!(compile("a:hover").unwrap(), "//a");
        assert_eq!(compile(":first-child").unwrap(), "//*");
        assert_eq!(compile("p, :hover").unwrap(), "//p | //*");
    }

    #[test]
    fn test_combinators_read_as_descendant() {
        assert_eq!(compile("ul > li").unwrap(), "//ul//li");
        assert_eq!(compile("ul>li").unwrap(), "//ul//li");
        assert_eq!(compile("h1 + p ~ span").unwrap(), "//h1//p//span");
        assert_eq!(compile(">").unwrap(), ".");
        assert_eq!(
            compile("[rel~=x] > a").unwrap(),
            "//*[contains(concat(' ', normalize-space(@rel), ' '), ' x ')]//a"
        );
    }

    #[test]
    fn test_empty_value_never_matches() {
        assert_eq!(compile("[href^='']").unwrap(), "//*[false()]");
        assert_eq!(compile("[href='']").unwrap(), "//*[@href='']");
    }

    #[test]
    fn test_malformed_brackets_are_rejected() {
        for bad in ["[href", "[=x]", "[a!=b]", "[a='x]", "[a=x y]"] {
            assert!(
                matches!(compile(bad), Err(Error::UnsupportedSelector(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(compile("[title=\"it's\"]").unwrap(), "//*[@title=\"it's\"]");
    }
}
