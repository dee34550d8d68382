//! Parser error types

use thiserror::Error;

/// Result type for lexing and parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Syntax errors raised while tokenizing or parsing an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A quoted string ran into the end of input
    #[error("unterminated string starting at position {position}")]
    UnclosedString {
        /// Offset of the opening quote
        position: usize,
    },

    /// An escape sequence inside a string literal could not be decoded
    #[error("invalid escape sequence '{sequence}' at position {position}")]
    InvalidEscape {
        /// The raw escape text
        sequence: String,
        /// Offset of the backslash
        position: usize,
    },

    /// A numeric lexeme that is neither a valid integer nor a valid float
    #[error("invalid number literal '{literal}' at position {position}")]
    InvalidNumber {
        /// The raw lexeme
        literal: String,
        /// Offset of the lexeme
        position: usize,
    },

    /// A token that cannot start or continue an expression here
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Textual form of the token
        token: String,
        /// Offset of the token
        position: usize,
    },

    /// Input ended where an operand was required
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A parenthesized sub-expression was not closed
    #[error("missing ) at position {position}")]
    MissingClosingParen {
        /// Offset where `)` was expected
        position: usize,
    },

    /// An argument list was not closed
    #[error("missing ) in args at position {position}")]
    MissingArgsClose {
        /// Offset where `,` or `)` was expected
        position: usize,
    },

    /// An index expression was not closed
    #[error("missing ] in index expression at position {position}")]
    MissingClosingBracket {
        /// Offset where `]` was expected
        position: usize,
    },

    /// A ternary expression lacks its `:` branch separator
    #[error("missing : in ternary expression at position {position}")]
    MissingColon {
        /// Offset where `:` was expected
        position: usize,
    },

    /// `.` was not followed by a usable member name
    #[error("expected member name at position {position}")]
    ExpectedMemberName {
        /// Offset of the offending token
        position: usize,
    },

    /// A complete expression was parsed but input remains
    #[error("unexpected trailing token '{token}' at position {position}")]
    TrailingToken {
        /// Textual form of the first extra token
        token: String,
        /// Offset of the first extra token
        position: usize,
    },

    /// Nesting went past the configured recursion limit
    #[error("stack overflow: expression nesting exceeds {limit}")]
    DepthExceeded {
        /// The configured maximum depth
        limit: usize,
    },
}

impl ParseError {
    /// Byte offset the error points at, when it has one
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnclosedString { position }
            | ParseError::InvalidEscape { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::MissingClosingParen { position }
            | ParseError::MissingArgsClose { position }
            | ParseError::MissingClosingBracket { position }
            | ParseError::MissingColon { position }
            | ParseError::ExpectedMemberName { position }
            | ParseError::TrailingToken { position, .. } => Some(*position),
            ParseError::UnexpectedEof | ParseError::DepthExceeded { .. } => None,
        }
    }
}
