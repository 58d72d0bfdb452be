//! Media condition lexer: tokenizes a condition string.

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    And, Not, All,

    // Literals
    Number,     // 0, 1.5, -0.2
    Dimension,  // 400px, 40rem, -0.2px

    Identifier,

    // Punctuation
    LParen, RParen, Colon, Comma,
    Plus, Dash,

    Eof,
}

/// Tokenize a media condition string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }

            // Numbers and dimensions, with an optional sign glued to the digits
            c if starts_number(c, chars.clone().nth(1).map(|(_, c)| c)) => {
                let start = pos;
                let mut text = String::new();
                let mut seen_dot = false;
                if c == '-' || c == '+' {
                    text.push(c);
                    chars.next();
                }
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else if c == '.' && !seen_dot {
                        seen_dot = true;
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut kind = TokenKind::Number;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphabetic() || c == '%' {
                        kind = TokenKind::Dimension;
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if split_dimension(&text).is_none() {
                    return Err(Error::InvalidCondition {
                        position: start,
                        message: format!("Malformed number: '{text}'"),
                    });
                }
                tokens.push(Token {
                    kind,
                    span: Span { start, end: start + text.len() },
                    text,
                });
            }

            // Identifiers and keywords; CSS identifiers may contain dashes
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '-' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = keyword_or_ident(&ident);
                tokens.push(Token {
                    kind,
                    span: Span { start, end: start + ident.len() },
                    text: ident,
                });
            }

            '(' => { chars.next(); tokens.push(punct(TokenKind::LParen, pos, "(")); }
            ')' => { chars.next(); tokens.push(punct(TokenKind::RParen, pos, ")")); }
            ':' => { chars.next(); tokens.push(punct(TokenKind::Colon, pos, ":")); }
            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, pos, ",")); }
            '+' => { chars.next(); tokens.push(punct(TokenKind::Plus, pos, "+")); }
            '-' => { chars.next(); tokens.push(punct(TokenKind::Dash, pos, "-")); }

            other => {
                return Err(Error::InvalidCondition {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

/// Split `"40rem"` into `(40.0, "rem")`. Unitless numbers return an empty unit.
pub(crate) fn split_dimension(text: &str) -> Option<(f64, &str)> {
    let text = text.trim();
    let unit_at = text
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_ascii_alphabetic() || c == '%')
        .map_or(text.len(), |(i, _)| i);
    let (number, unit) = text.split_at(unit_at);
    let value: f64 = number.parse().ok()?;
    value.is_finite().then_some((value, unit))
}

fn starts_number(c: char, next: Option<char>) -> bool {
    let digitish = |c: char| c.is_ascii_digit() || c == '.';
    match c {
        '-' | '+' => next.is_some_and(digitish),
        c => digitish(c),
    }
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}

fn keyword_or_ident(s: &str) -> TokenKind {
    match s.to_ascii_lowercase().as_str() {
        "and" => TokenKind::And,
        "not" => TokenKind::Not,
        "all" => TokenKind::All,
        _ => TokenKind::Identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_condition() {
        let tokens = tokenize("(min-width: 400px) and (max-width: 699.8px)").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::LParen,
            TokenKind::Identifier, // min-width
            TokenKind::Colon,
            TokenKind::Dimension,  // 400px
            TokenKind::RParen,
            TokenKind::And,
            TokenKind::LParen,
            TokenKind::Identifier, // max-width
            TokenKind::Colon,
            TokenKind::Dimension,  // 699.8px
            TokenKind::RParen,
            TokenKind::Eof,
        ]);
        assert_eq!(tokens[1].text, "min-width");
        assert_eq!(tokens[9].text, "699.8px");
    }

    #[test]
    fn test_calc_minus_is_a_dash() {
        let tokens = tokenize("calc(70rem - 0.2px)").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Dimension,
            TokenKind::Dash,
            TokenKind::Dimension,
            TokenKind::RParen,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_signed_dimension() {
        let tokens = tokenize("-0.2px").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Dimension);
        assert_eq!(tokens[0].text, "-0.2px");
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("NOT All AND").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Not);
        assert_eq!(tokens[1].kind, TokenKind::All);
        assert_eq!(tokens[2].kind, TokenKind::And);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("(min-width: 400px) & (max-width: 1px)").unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { position: 19, .. }));
    }

    #[test]
    fn test_split_dimension() {
        assert_eq!(split_dimension("40rem"), Some((40.0, "rem")));
        assert_eq!(split_dimension("-0.2px"), Some((-0.2, "px")));
        assert_eq!(split_dimension("0"), Some((0.0, "")));
        assert_eq!(split_dimension("rem"), None);
    }
}
