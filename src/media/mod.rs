//! # Media Conditions
//!
//! Width-only media query model: AST, lexer, parser and viewport evaluation.
//! Pure functions with no I/O and no environment dependency.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod viewport;

use crate::Result;

pub use ast::{Length, MediaCondition, MediaQuery, WidthFeature};
pub use viewport::{Viewport, DEFAULT_ROOT_FONT_SIZE_PX};

/// Parse a media condition string into an AST.
pub fn parse(condition: &str) -> Result<MediaQuery> {
    let tokens = lexer::tokenize(condition)?;
    parser::parse_query(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrips_through_parse() {
        let text = "(min-width: 40rem) and (max-width: calc(70rem - 0.2px)), (max-width: 575.8px)";
        let query = parse(text).unwrap();
        assert_eq!(query.to_string(), text);
    }
}
