//! Expression parser
//!
//! Converts expression text into an Abstract Syntax Tree (AST) with a
//! pull-based tokenizer and a Pratt parser.

pub mod error;
pub mod lexer;
pub mod pratt;
pub mod span;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{DEFAULT_MAX_DEPTH, PrattParser, parse_expression_pratt};
pub use span::Spanned;
pub use tokenizer::{Token, Tokenizer};

/// Parse an expression string into an AST with the default depth limit
pub fn parse_expression(input: &str) -> ParseResult<crate::ast::ExpressionNode> {
    parse_expression_pratt(input)
}

/// Parse an expression string with a custom nesting limit
pub fn parse_with_max_depth(
    input: &str,
    max_depth: usize,
) -> ParseResult<crate::ast::ExpressionNode> {
    PrattParser::with_max_depth(input, max_depth)?.parse()
}
