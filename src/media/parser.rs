//! Media condition recursive descent parser.
//!
//! Parses token streams into the width-only AST. Supports:
//! - `(min-width: L)` / `(max-width: L)` joined with `and`
//! - `all`, optionally followed by `and` features
//! - comma separated query lists, and `not all`
//! - lengths `Npx`, `N<unit>`, `0`, and `calc(L - Npx)` / `calc(L + Npx)`

use super::ast::*;
use super::lexer::{split_dimension, Token, TokenKind};
use crate::{Error, Result};

/// Read position in a token stream produced by `tokenize`.
///
/// The cursor never moves past `Eof`, so every grammar rule can look at the
/// current token without bounds checks of its own.
struct Cursor<'t> {
    rest: &'t [Token],
    /// offset reported when the stream is exhausted
    end: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map_or(0, |tok| tok.span.end);
        Self { rest: tokens, end }
    }

    fn current(&self) -> Option<&'t Token> {
        self.rest.first()
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|tok| tok.kind == kind)
    }

    fn bump(&mut self) -> Option<&'t Token> {
        let (tok, rest) = self.rest.split_first()?;
        if tok.kind != TokenKind::Eof {
            self.rest = rest;
        }
        Some(tok)
    }

    fn bump_if(&mut self, kind: TokenKind) -> Option<&'t Token> {
        if self.is(kind) { self.bump() } else { None }
    }

    /// Consume a `kind` token or fail naming what the grammar wanted there.
    fn require(&mut self, kind: TokenKind, wanted: &str) -> Result<&'t Token> {
        match self.bump_if(kind) {
            Some(tok) => Ok(tok),
            None => Err(self.unexpected(wanted)),
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        let (position, found) = match self.current() {
            Some(tok) if tok.kind == TokenKind::Eof => (tok.span.start, "end of input".to_string()),
            Some(tok) => (tok.span.start, format!("'{}'", tok.text)),
            None => (self.end, "end of input".to_string()),
        };
        Error::InvalidCondition {
            position,
            message: format!("Expected {wanted}, found {found}"),
        }
    }
}

// ============================================================================
// Query list
// ============================================================================

fn query_list(cursor: &mut Cursor<'_>) -> Result<MediaQuery> {
    if cursor.bump_if(TokenKind::Not).is_some() {
        cursor.require(TokenKind::All, "'all' after 'not'")?;
        cursor.require(TokenKind::Eof, "end of condition")?;
        return Ok(MediaQuery::none());
    }

    let mut conditions = vec![condition(cursor)?];
    while cursor.bump_if(TokenKind::Comma).is_some() {
        conditions.push(condition(cursor)?);
    }
    cursor.require(TokenKind::Eof, "',' or end of condition")?;
    Ok(MediaQuery { conditions })
}

fn condition(cursor: &mut Cursor<'_>) -> Result<MediaCondition> {
    let mut condition = MediaCondition::all();
    if cursor.bump_if(TokenKind::All).is_some() && cursor.bump_if(TokenKind::And).is_none() {
        return Ok(condition);
    }
    loop {
        condition.features.push(feature(cursor)?);
        if cursor.bump_if(TokenKind::And).is_none() {
            return Ok(condition);
        }
    }
}

fn feature(cursor: &mut Cursor<'_>) -> Result<WidthFeature> {
    cursor.require(TokenKind::LParen, "'(' before a media feature")?;
    let name = cursor.require(TokenKind::Identifier, "media feature name")?;
    let bound: fn(Length) -> WidthFeature = match name.text.to_ascii_lowercase().as_str() {
        "min-width" => WidthFeature::Min,
        "max-width" => WidthFeature::Max,
        other => return Err(Error::UnsupportedFeature(other.to_string())),
    };
    cursor.require(TokenKind::Colon, "':' after the feature name")?;
    let value = length(cursor)?;
    cursor.require(TokenKind::RParen, "')' after the feature value")?;
    Ok(bound(value))
}

// ============================================================================
// Lengths
// ============================================================================

fn length(cursor: &mut Cursor<'_>) -> Result<Length> {
    if let Some(tok) = cursor.bump_if(TokenKind::Dimension) {
        return dimension_length(tok);
    }
    if let Some(tok) = cursor.bump_if(TokenKind::Number) {
        // only zero may drop its unit
        return match split_dimension(&tok.text) {
            Some((value, _)) if value == 0.0 => Ok(Length::Px(0.0)),
            _ => Err(Error::InvalidCondition {
                position: tok.span.start,
                message: format!("Length '{}' requires a unit", tok.text),
            }),
        };
    }
    match cursor.current() {
        Some(tok) if tok.kind == TokenKind::Identifier && tok.text.eq_ignore_ascii_case("calc") => {
            cursor.bump();
            calc(cursor)
        }
        _ => Err(cursor.unexpected("a length")),
    }
}

/// `calc(L - Npx)` or `calc(L + Npx)`; addition is stored as a negative offset.
fn calc(cursor: &mut Cursor<'_>) -> Result<Length> {
    cursor.require(TokenKind::LParen, "'(' after calc")?;
    let base = length(cursor)?;
    let sign = if cursor.bump_if(TokenKind::Dash).is_some() {
        1.0
    } else if cursor.bump_if(TokenKind::Plus).is_some() {
        -1.0
    } else {
        return Err(cursor.unexpected("'-' or '+' in calc"));
    };
    let offset = length(cursor)?;
    cursor.require(TokenKind::RParen, "')' closing calc")?;

    let Some(px) = offset.as_px() else {
        return Err(Error::UnsupportedLength(format!("calc offset '{offset}'")));
    };
    Ok(Length::Calc { base: Box::new(base), minus_px: sign * px })
}

fn dimension_length(tok: &Token) -> Result<Length> {
    match split_dimension(&tok.text) {
        Some((value, unit)) if unit.eq_ignore_ascii_case("px") => Ok(Length::Px(value)),
        Some(_) => Ok(Length::Raw(tok.text.clone())),
        None => Err(Error::InvalidCondition {
            position: tok.span.start,
            message: format!("Malformed dimension: '{}'", tok.text),
        }),
    }
}

/// Parse a token stream into a media query list.
pub fn parse_query(tokens: &[Token]) -> Result<MediaQuery> {
    query_list(&mut Cursor::new(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::lexer::tokenize;

    fn parse(input: &str) -> Result<MediaQuery> {
        parse_query(&tokenize(input)?)
    }

    #[test]
    fn test_bounded_span() {
        let query = parse("(min-width: 400px) and (max-width: 699.8px)").unwrap();
        assert_eq!(query.conditions.len(), 1);
        assert_eq!(
            query.conditions[0].features.as_slice(),
            &[
                WidthFeature::Min(Length::Px(400.0)),
                WidthFeature::Max(Length::Px(699.8)),
            ]
        );
    }

    #[test]
    fn test_calc_with_raw_base() {
        let query = parse("(max-width: calc(70rem - 0.2px))").unwrap();
        let expected = WidthFeature::Max(Length::Calc {
            base: Box::new(Length::Raw("70rem".into())),
            minus_px: 0.2,
        });
        assert_eq!(query.conditions[0].single(), Some(&expected));
    }

    #[test]
    fn test_calc_addition() {
        let query = parse("(min-width: calc(2em + 1.5px))").unwrap();
        let feature = query.conditions[0].single().unwrap();
        assert_eq!(
            feature.length(),
            &Length::Calc { base: Box::new(Length::Raw("2em".into())), minus_px: -1.5 }
        );
    }

    #[test]
    fn test_all_and_lists() {
        let query = parse("all, (min-width: 0)").unwrap();
        assert_eq!(query.conditions.len(), 2);
        assert!(query.conditions[0].is_all());
        assert_eq!(
            query.conditions[1].single(),
            Some(&WidthFeature::Min(Length::Px(0.0)))
        );

        let restricted = parse("all and (max-width: 10px)").unwrap();
        assert_eq!(restricted.conditions[0].features.len(), 1);
    }

    #[test]
    fn test_not_all() {
        assert!(parse("not all").unwrap().is_empty());
    }

    #[test]
    fn test_unitless_length_rejected() {
        let err = parse("(min-width: 400)").unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { position: 12, .. }));
    }

    #[test]
    fn test_unknown_feature() {
        let err = parse("(orientation: landscape)").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(name) if name == "orientation"));
    }

    #[test]
    fn test_error_names_the_expected_token() {
        let err = parse("(min-width 400px)").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCondition { position: 11, ref message }
                if message == "Expected ':' after the feature name, found '400px'"
        ));

        let err = parse("(max-width: 10px").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCondition { ref message, .. }
                if message == "Expected ')' after the feature value, found end of input"
        ));
    }

    #[test]
    fn test_empty_token_stream() {
        assert!(matches!(parse_query(&[]), Err(Error::InvalidCondition { position: 0, .. })));
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse("(min-width: 1px) (max-width: 2px)").is_err());
        assert!(parse("(min-width: 1px) and").is_err());
        assert!(parse("").is_err());
    }
}
