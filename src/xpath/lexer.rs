//! XPath tokenizer.
//!
//! Handles the XPath 1.0 lexical disambiguation rule: `*` and the names `and`,
//! `or`, `mod`, `div` are operators only when a preceding token exists and is
//! not `@`, `::`, `(`, `[`, `,` or another operator.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    ColonColon,
    Dot,
    DotDot,
    Pipe,
    Plus,
    Minus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `*` as a name test.
    Star,
    /// `*` as multiplication.
    Multiply,
    And,
    Or,
    Mod,
    Div,
    Literal(String),
    Number(f64),
    Name(String),
}

impl Token {
    fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Eq
                | Token::Ne
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
                | Token::Multiply
                | Token::And
                | Token::Or
                | Token::Mod
                | Token::Div
        )
    }

    /// Whether the next `*` or operator-name must be read as an operator.
    fn forces_operator(prev: Option<&Token>) -> bool {
        match prev {
            None => false,
            Some(t) => !(t.is_operator()
                || matches!(
                    t,
                    Token::At | Token::ColonColon | Token::LParen | Token::LBracket | Token::Comma
                )),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            '/' if next == Some('/') => {
                i += 2;
                Token::DoubleSlash
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '@' => {
                i += 1;
                Token::At
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            ':' if next == Some(':') => {
                i += 2;
                Token::ColonColon
            }
            '.' if next == Some('.') => {
                i += 2;
                Token::DotDot
            }
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                let (num, end) = read_number(&chars, i);
                i = end;
                Token::Number(num)
            }
            '.' => {
                i += 1;
                Token::Dot
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '=' => {
                i += 1;
                Token::Eq
            }
            '!' if next == Some('=') => {
                i += 2;
                Token::Ne
            }
            '<' if next == Some('=') => {
                i += 2;
                Token::Le
            }
            '<' => {
                i += 1;
                Token::Lt
            }
            '>' if next == Some('=') => {
                i += 2;
                Token::Ge
            }
            '>' => {
                i += 1;
                Token::Gt
            }
            '*' => {
                i += 1;
                if Token::forces_operator(tokens.last()) {
                    Token::Multiply
                } else {
                    Token::Star
                }
            }
            '"' | '\'' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| Error::InvalidXPath(format!("unterminated literal in {input:?}")))?;
                let literal: String = chars[i + 1..i + 1 + close].iter().collect();
                i += close + 2;
                Token::Literal(literal)
            }
            d if d.is_ascii_digit() => {
                let (num, end) = read_number(&chars, i);
                i = end;
                Token::Number(num)
            }
            n if is_name_start(n) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if Token::forces_operator(tokens.last()) {
                    match name.as_str() {
                        "and" => Token::And,
                        "or" => Token::Or,
                        "mod" => Token::Mod,
                        "div" => Token::Div,
                        _ => Token::Name(name),
                    }
                } else {
                    Token::Name(name)
                }
            }
            '$' => {
                return Err(Error::InvalidXPath(format!(
                    "variable references are not supported: {input:?}"
                )));
            }
            other => {
                return Err(Error::InvalidXPath(format!(
                    "unexpected character {other:?} in {input:?}"
                )));
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> (f64, usize) {
    let mut end = start;
    let mut seen_dot = false;
    while end < chars.len() {
        match chars[end] {
            d if d.is_ascii_digit() => end += 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    let text: String = chars[start..end].iter().collect();
    (text.parse().unwrap_or(f64::NAN), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_disambiguation() {
        let tokens = tokenize("//*[2 * 3]").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::DoubleSlash,
                Token::Star,
                Token::LBracket,
                Token::Number(2.0),
                Token::Multiply,
                Token::Number(3.0),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_operator_names_only_after_operands() {
        let tokens = tokenize("div[@a and @b]").unwrap();
        assert_eq!(tokens[0], Token::Name("div".into()));
        assert!(tokens.contains(&Token::And));
    }

    #[test]
    fn test_hyphenated_function_names() {
        let tokens = tokenize("string-length(@x) - 1").unwrap();
        assert_eq!(tokens[0], Token::Name("string-length".into()));
        assert!(tokens.contains(&Token::Minus));
    }

    #[test]
    fn test_literals_and_numbers() {
        let tokens = tokenize(r#"'a b' "c'd" .5 10"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("a b".into()),
                Token::Literal("c'd".into()),
                Token::Number(0.5),
                Token::Number(10.0),
            ]
        );
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        assert!(matches!(tokenize("//a[@x='1]"), Err(Error::InvalidXPath(_))));
    }

    #[test]
    fn test_axis_separator() {
        let tokens = tokenize("ancestor::div").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("ancestor".into()),
                Token::ColonColon,
                Token::Name("div".into()),
            ]
        );
    }
}
