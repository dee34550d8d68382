//! Pratt parser for expressions
//!
//! Precedence climbing over a two-token window: a primary ("null
//! denotation") is parsed for the current token, then operators are folded
//! onto the accumulated left side while their binding power exceeds the
//! caller's threshold.

use super::error::{ParseError, ParseResult};
use super::lexer::TokenCursor;
use super::span::Spanned;
use super::tokenizer::Token;
use crate::ast::{Arguments, BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};
use crate::stack::ensure_sufficient_stack;

/// Default cap on nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Binding power of member and index access
const ACCESS_PRECEDENCE: u8 = 100;

/// Binding power of the ternary `?`
const TERNARY_PRECEDENCE: u8 = 5;

/// Map a token to its binary operator
#[inline]
fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    let op = match token {
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Subtract,
        Token::Star => BinaryOperator::Multiply,
        Token::Slash => BinaryOperator::Divide,
        Token::Percent => BinaryOperator::Modulo,
        Token::ShiftLeft => BinaryOperator::ShiftLeft,
        Token::ShiftRight => BinaryOperator::ShiftRight,
        Token::Ampersand => BinaryOperator::BitAnd,
        Token::Pipe => BinaryOperator::BitOr,
        Token::Caret => BinaryOperator::BitXor,
        Token::LessThan => BinaryOperator::LessThan,
        Token::GreaterThan => BinaryOperator::GreaterThan,
        Token::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
        Token::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
        Token::Equal => BinaryOperator::Equal,
        Token::NotEqual => BinaryOperator::NotEqual,
        Token::And => BinaryOperator::And,
        Token::Or => BinaryOperator::Or,
        _ => return None,
    };
    Some(op)
}

/// Left binding power of a token; zero stops the climbing loop
#[inline]
fn get_precedence(token: Option<&Token<'_>>) -> u8 {
    match token {
        Some(Token::Dot | Token::LeftBracket) => ACCESS_PRECEDENCE,
        Some(Token::Question) => TERNARY_PRECEDENCE,
        Some(other) => token_to_binary_op(other).map_or(0, BinaryOperator::precedence),
        None => 0,
    }
}

#[inline]
fn token_to_unary_op(token: &Token<'_>) -> Option<UnaryOperator> {
    match token {
        Token::Bang => Some(UnaryOperator::Not),
        Token::Minus => Some(UnaryOperator::Negate),
        Token::Tilde => Some(UnaryOperator::BitNot),
        _ => None,
    }
}

/// Recursive-descent parser with operator precedence
pub struct PrattParser<'input> {
    cursor: TokenCursor<'input>,
    max_depth: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a parser with the default depth limit
    pub fn new(input: &'input str) -> ParseResult<Self> {
        Self::with_max_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Create a parser with a custom depth limit
    pub fn with_max_depth(input: &'input str, max_depth: usize) -> ParseResult<Self> {
        Ok(Self {
            cursor: TokenCursor::new(input)?,
            max_depth,
        })
    }

    /// Parse the whole input as one expression
    pub fn parse(mut self) -> ParseResult<ExpressionNode> {
        let expression = self.parse_expression(0, 0)?;
        if let Some(token) = self.cursor.current() {
            return Err(ParseError::TrailingToken {
                token: token.to_string(),
                position: self.cursor.position(),
            });
        }
        Ok(expression)
    }

    fn advance(&mut self) -> ParseResult<Spanned<Token<'input>>> {
        self.cursor.advance()?.ok_or(ParseError::UnexpectedEof)
    }

    /// Consume the current token if it equals `expected`
    fn eat(&mut self, expected: &Token<'_>) -> ParseResult<bool> {
        if self.cursor.at(expected) {
            self.cursor.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_expression(&mut self, rbp: u8, depth: usize) -> ParseResult<ExpressionNode> {
        ensure_sufficient_stack(|| {
            if depth > self.max_depth {
                return Err(ParseError::DepthExceeded {
                    limit: self.max_depth,
                });
            }

            let token = self.advance()?;
            let mut left = self.parse_primary(token, depth)?;

            while rbp < get_precedence(self.cursor.current()) {
                let operator = self.advance()?;
                left = self.parse_infix(operator, left, depth)?;
            }

            Ok(left)
        })
    }

    /// Null denotation: literals, names, calls, groups and prefix operators
    fn parse_primary(
        &mut self,
        token: Spanned<Token<'input>>,
        depth: usize,
    ) -> ParseResult<ExpressionNode> {
        let position = token.start;
        match token.value {
            Token::Number(lexeme) => parse_number(lexeme, position).map(ExpressionNode::literal),
            Token::String(text) => Ok(ExpressionNode::literal(LiteralValue::String(text))),
            Token::Identifier("true") => Ok(ExpressionNode::literal(LiteralValue::Boolean(true))),
            Token::Identifier("false") => {
                Ok(ExpressionNode::literal(LiteralValue::Boolean(false)))
            }
            Token::Identifier(name) => {
                if self.eat(&Token::LeftParen)? {
                    let args = self.parse_arguments(depth)?;
                    Ok(ExpressionNode::function_call(name, args))
                } else {
                    Ok(ExpressionNode::variable(name))
                }
            }
            Token::LeftParen => {
                let inner = self.parse_expression(0, depth + 1)?;
                if !self.eat(&Token::RightParen)? {
                    return Err(ParseError::MissingClosingParen {
                        position: self.cursor.position(),
                    });
                }
                Ok(inner)
            }
            other => match token_to_unary_op(&other) {
                Some(op) => {
                    let operand = self.parse_expression(UnaryOperator::PRECEDENCE, depth + 1)?;
                    Ok(ExpressionNode::unary_op(op, operand))
                }
                None => Err(ParseError::UnexpectedToken {
                    token: other.to_string(),
                    position,
                }),
            },
        }
    }

    /// Left denotation: ternary, indexing, member access and infix operators
    fn parse_infix(
        &mut self,
        operator: Spanned<Token<'input>>,
        left: ExpressionNode,
        depth: usize,
    ) -> ParseResult<ExpressionNode> {
        match operator.value {
            Token::Question => {
                let then_expr = self.parse_expression(0, depth + 1)?;
                if !self.eat(&Token::Colon)? {
                    return Err(ParseError::MissingColon {
                        position: self.cursor.position(),
                    });
                }
                let else_expr = self.parse_expression(TERNARY_PRECEDENCE - 1, depth + 1)?;
                Ok(ExpressionNode::conditional(left, then_expr, else_expr))
            }
            Token::LeftBracket => self.parse_index(left, depth),
            Token::Dot => {
                // `a.[0]` is an alternate spelling of `a[0]`
                if self.eat(&Token::LeftBracket)? {
                    return self.parse_index(left, depth);
                }
                let member = self.parse_member_name()?;
                if self.eat(&Token::LeftParen)? {
                    let args = self.parse_arguments(depth)?;
                    Ok(ExpressionNode::method_call(left, member, args))
                } else {
                    Ok(ExpressionNode::member(left, member))
                }
            }
            other => match token_to_binary_op(&other) {
                Some(op) => {
                    let right = self.parse_expression(op.precedence(), depth + 1)?;
                    Ok(ExpressionNode::binary_op(op, left, right))
                }
                None => Err(ParseError::UnexpectedToken {
                    token: other.to_string(),
                    position: operator.start,
                }),
            },
        }
    }

    /// Index body after `[`, through the closing `]`
    fn parse_index(&mut self, left: ExpressionNode, depth: usize) -> ParseResult<ExpressionNode> {
        let index = self.parse_expression(0, depth + 1)?;
        if !self.eat(&Token::RightBracket)? {
            return Err(ParseError::MissingClosingBracket {
                position: self.cursor.position(),
            });
        }
        Ok(ExpressionNode::index(left, index))
    }

    /// Identifier, numeric lexeme (`scores.1`) or string after a dot
    fn parse_member_name(&mut self) -> ParseResult<String> {
        let position = self.cursor.position();
        let name = match self.cursor.current() {
            Some(Token::Identifier(name) | Token::Number(name)) => (*name).to_string(),
            Some(Token::String(text)) => text.clone(),
            _ => return Err(ParseError::ExpectedMemberName { position }),
        };
        self.cursor.advance()?;
        Ok(name)
    }

    /// Comma-separated arguments after `(`, through the closing `)`
    fn parse_arguments(&mut self, depth: usize) -> ParseResult<Arguments> {
        let mut args = Arguments::new();
        loop {
            if self.eat(&Token::RightParen)? {
                return Ok(args);
            }
            if self.cursor.is_at_end() {
                return Err(ParseError::MissingArgsClose {
                    position: self.cursor.position(),
                });
            }

            args.push(self.parse_expression(0, depth + 1)?);

            if !self.eat(&Token::Comma)? && !self.cursor.at(&Token::RightParen) {
                return Err(ParseError::MissingArgsClose {
                    position: self.cursor.position(),
                });
            }
        }
    }
}

/// Numbers containing a dot are floats, everything else is an integer
fn parse_number(lexeme: &str, position: usize) -> ParseResult<LiteralValue> {
    let literal = if lexeme.contains('.') {
        lexeme.parse::<f64>().ok().map(LiteralValue::Float)
    } else {
        lexeme.parse::<i64>().ok().map(LiteralValue::Integer)
    };
    literal.ok_or_else(|| ParseError::InvalidNumber {
        literal: lexeme.to_string(),
        position,
    })
}

/// Parse an expression with the default depth limit
pub fn parse_expression_pratt(input: &str) -> ParseResult<ExpressionNode> {
    PrattParser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canonical(input: &str) -> String {
        parse_expression_pratt(input).unwrap().to_string()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(canonical("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(canonical("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(canonical("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(canonical("a || b && c"), "(a || (b && c))");
        assert_eq!(canonical("1 << 2 + 3"), "((1 << 2) + 3)");
        assert_eq!(canonical("a == b < c"), "(a == (b < c))");
        assert_eq!(canonical("x & 1 | 2"), "((x & 1) | 2)");
    }

    #[test]
    fn test_unary_binds_tighter_than_infix() {
        assert_eq!(canonical("-2 * 3"), "((-2) * 3)");
        assert_eq!(canonical("!a && b"), "((!a) && b)");
        assert_eq!(canonical("~x.y"), "(~x.y)");
        assert_eq!(canonical("--1"), "(-(-1))");
    }

    #[test]
    fn test_ternary_is_right_associative() {
        assert_eq!(
            canonical("false ? 1 : true ? 2 : 3"),
            "(false ? 1 : (true ? 2 : 3))"
        );
        assert_eq!(canonical("a > 1 ? 'x' : 'y'"), r#"((a > 1) ? "x" : "y")"#);
    }

    #[test]
    fn test_access_forms() {
        assert_eq!(canonical("user.name"), "user.name");
        assert_eq!(canonical("matrix[0][1]"), "matrix[0][1]");
        assert_eq!(canonical("arr.[0]"), "arr[0]");
        assert_eq!(canonical("scores.1"), r#"scores."1""#);
        assert_eq!(canonical("user.Greet('a', 1)"), r#"user.Greet("a", 1)"#);
        assert_eq!(canonical("len()"), "len()");
        assert_eq!(canonical("f(1, 2,)"), "f(1, 2)");
    }

    #[test]
    fn test_literals() {
        let node = parse_expression_pratt("2.5").unwrap();
        assert_eq!(node.as_literal(), Some(&LiteralValue::Float(2.5)));
        let node = parse_expression_pratt("true").unwrap();
        assert_eq!(node.as_literal(), Some(&LiteralValue::Boolean(true)));
        let node = parse_expression_pratt("truth").unwrap();
        assert_eq!(node.as_variable(), Some("truth"));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_expression_pratt("1 +"),
            Err(ParseError::UnexpectedEof)
        ));
        assert!(matches!(
            parse_expression_pratt("(1 + 2"),
            Err(ParseError::MissingClosingParen { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("f(1, 2"),
            Err(ParseError::MissingArgsClose { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("f(1 2)"),
            Err(ParseError::MissingArgsClose { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("a[1"),
            Err(ParseError::MissingClosingBracket { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("a ? 1"),
            Err(ParseError::MissingColon { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("a.+"),
            Err(ParseError::ExpectedMemberName { .. })
        ));
        assert!(matches!(
            parse_expression_pratt("@1"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
        assert!(matches!(
            parse_expression_pratt("1.2.3"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_trailing_tokens() {
        assert_eq!(
            parse_expression_pratt("10 = 20").unwrap_err(),
            ParseError::TrailingToken {
                token: "=".to_string(),
                position: 3,
            }
        );
        assert!(parse_expression_pratt("1 2").is_err());
        assert!(parse_expression_pratt("a )").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));

        assert!(parse_expression_pratt(&nested(256)).is_ok());
        assert_eq!(
            parse_expression_pratt(&nested(258)).unwrap_err(),
            ParseError::DepthExceeded { limit: 256 }
        );

        let shallow_input = nested(5);
        let shallow = PrattParser::with_max_depth(&shallow_input, 3).unwrap();
        assert!(shallow.parse().is_err());
    }

    #[test]
    fn test_long_chain_is_not_depth_limited() {
        let chain = vec!["1"; 2_000].join(" + ");
        assert!(parse_expression_pratt(&chain).is_ok());
    }
}
