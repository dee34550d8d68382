//! Pull-based tokenizer for expressions
//!
//! Each call to [`Tokenizer::next_token`] yields exactly one token together
//! with its byte offsets, so the parser can keep a two-token window without
//! materializing the whole stream.

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use std::fmt;
use unicode_xid::UnicodeXID;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Numeric lexeme made of digits and dots (e.g. `42`, `2.5`)
    Number(&'input str),
    /// String literal with escapes already decoded
    String(String),
    /// Identifier, including the words `true` and `false`
    Identifier(&'input str),

    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Argument separator `,`
    Comma,
    /// Member access `.`
    Dot,
    /// Left square bracket `[`
    LeftBracket,
    /// Right square bracket `]`
    RightBracket,

    /// Addition or concatenation `+`
    Plus,
    /// Subtraction or negation `-`
    Minus,
    /// Multiplication `*`
    Star,
    /// Division `/`
    Slash,
    /// Remainder `%`
    Percent,
    /// Left shift `<<`
    ShiftLeft,
    /// Right shift `>>`
    ShiftRight,
    /// Bitwise AND `&`
    Ampersand,
    /// Bitwise OR `|`
    Pipe,
    /// Bitwise XOR `^`
    Caret,
    /// Less than `<`
    LessThan,
    /// Greater than `>`
    GreaterThan,
    /// Less than or equal `<=`
    LessThanOrEqual,
    /// Greater than or equal `>=`
    GreaterThanOrEqual,
    /// Equality `==`
    Equal,
    /// Inequality `!=`
    NotEqual,
    /// Logical AND `&&`
    And,
    /// Logical OR `||`
    Or,
    /// Logical NOT `!`
    Bang,
    /// Bitwise NOT `~`
    Tilde,
    /// Ternary condition `?`
    Question,
    /// Ternary branch separator `:`
    Colon,

    /// Any other single character; only ever an error for the parser
    Other(char),
}

impl<'input> Token<'input> {
    /// Get identifier text if this token is an identifier
    #[inline]
    pub fn as_identifier(&self) -> Option<&'input str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Textual form of an operator or punctuation token
    pub fn symbol(&self) -> Option<&'static str> {
        let symbol = match self {
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::LessThanOrEqual => "<=",
            Token::GreaterThanOrEqual => ">=",
            Token::Equal => "==",
            Token::NotEqual => "!=",
            Token::And => "&&",
            Token::Or => "||",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Number(_) | Token::String(_) | Token::Identifier(_) | Token::Other(_) => {
                return None;
            }
        };
        Some(symbol)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(lexeme) | Token::Identifier(lexeme) => f.write_str(lexeme),
            Token::String(text) => write!(f, "{text:?}"),
            Token::Other(ch) => write!(f, "{ch}"),
            other => f.write_str(other.symbol().unwrap_or_default()),
        }
    }
}

/// Tokenizer over a borrowed expression string
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer positioned at the start of `input`
    #[inline]
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    #[inline]
    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    #[inline]
    fn is_id_start(ch: char) -> bool {
        ch == '_' || UnicodeXID::is_xid_start(ch)
    }

    #[inline]
    fn is_id_continue(ch: char) -> bool {
        UnicodeXID::is_xid_continue(ch)
    }

    /// Digits and literal dots; validity is decided by the parser
    fn scan_number(&mut self) -> &'input str {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn scan_identifier(&mut self) -> &'input str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !Self::is_id_continue(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.input[start..self.pos]
    }

    /// Scan a quoted string, decoding escapes as it goes
    fn scan_string(&mut self, quote: char) -> ParseResult<String> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut text = String::new();

        while let Some(ch) = self.peek_char() {
            if ch == quote {
                self.pos += ch.len_utf8();
                return Ok(text);
            }
            if ch == '\\' {
                text.push(self.scan_escape()?);
                continue;
            }
            self.pos += ch.len_utf8();
            text.push(ch);
        }

        Err(ParseError::UnclosedString { position: start })
    }

    /// Decode one escape sequence; `self.pos` points at the backslash
    fn scan_escape(&mut self) -> ParseResult<char> {
        let start = self.pos;
        self.pos += 1;
        let Some(kind) = self.peek_char() else {
            return Err(ParseError::UnclosedString { position: start });
        };
        self.pos += kind.len_utf8();

        let decoded = match kind {
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'x' => self.scan_radix_digits(2, 16).map(|v| char::from(v as u8)),
            'u' => self.scan_radix_digits(4, 16).and_then(char::from_u32),
            'U' => self.scan_radix_digits(8, 16).and_then(char::from_u32),
            '0'..='7' => {
                self.pos -= 1;
                self.scan_radix_digits(3, 8)
                    .filter(|v| *v <= 0o377)
                    .map(|v| char::from(v as u8))
            }
            _ => None,
        };

        decoded.ok_or_else(|| {
            let end = self.pos.min(self.input.len());
            ParseError::InvalidEscape {
                sequence: self.input.get(start..end).unwrap_or("\\").to_string(),
                position: start,
            }
        })
    }

    /// Read exactly `count` digits in `radix`, consuming only what matched
    fn scan_radix_digits(&mut self, count: usize, radix: u32) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.peek_byte_at(0).and_then(|b| char::from(b).to_digit(radix))?;
            self.pos += 1;
            value = value * radix + digit;
        }
        Some(value)
    }

    /// Return the next token, or `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Spanned<Token<'input>>>> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        let token = match ch {
            '0'..='9' => Token::Number(self.scan_number()),
            '\'' | '"' => Token::String(self.scan_string(ch)?),
            c if Self::is_id_start(c) => Token::Identifier(self.scan_identifier()),
            _ => {
                let (token, width) = match (ch, self.peek_byte_at(1)) {
                    ('=', Some(b'=')) => (Token::Equal, 2),
                    ('!', Some(b'=')) => (Token::NotEqual, 2),
                    ('<', Some(b'=')) => (Token::LessThanOrEqual, 2),
                    ('>', Some(b'=')) => (Token::GreaterThanOrEqual, 2),
                    ('&', Some(b'&')) => (Token::And, 2),
                    ('|', Some(b'|')) => (Token::Or, 2),
                    ('<', Some(b'<')) => (Token::ShiftLeft, 2),
                    ('>', Some(b'>')) => (Token::ShiftRight, 2),
                    ('(', _) => (Token::LeftParen, 1),
                    (')', _) => (Token::RightParen, 1),
                    (',', _) => (Token::Comma, 1),
                    ('.', _) => (Token::Dot, 1),
                    ('[', _) => (Token::LeftBracket, 1),
                    (']', _) => (Token::RightBracket, 1),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('%', _) => (Token::Percent, 1),
                    ('&', _) => (Token::Ampersand, 1),
                    ('|', _) => (Token::Pipe, 1),
                    ('^', _) => (Token::Caret, 1),
                    ('<', _) => (Token::LessThan, 1),
                    ('>', _) => (Token::GreaterThan, 1),
                    ('!', _) => (Token::Bang, 1),
                    ('~', _) => (Token::Tilde, 1),
                    ('?', _) => (Token::Question, 1),
                    (':', _) => (Token::Colon, 1),
                    (other, _) => (Token::Other(other), other.len_utf8()),
                };
                self.pos += width;
                token
            }
        };

        Ok(Some(Spanned::new(token, start, self.pos)))
    }

    /// Tokenize the remaining input
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Spanned<Token<'input>>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Convenience function to tokenize a whole expression
/// Whether `text` lexes as exactly one identifier token
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(Tokenizer::is_id_start) && chars.all(Tokenizer::is_id_continue)
}

pub fn tokenize(input: &str) -> ParseResult<Vec<Spanned<Token<'_>>>> {
    Tokenizer::new(input).tokenize_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.value)
            .collect()
    }

    #[test]
    fn test_tokenizer_basic() {
        let mut tokenizer = Tokenizer::new("user.name");

        let token1 = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(token1.value.as_identifier(), Some("user"));
        assert_eq!((token1.start, token1.end), (0, 4));

        let token2 = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(token2.value, Token::Dot);

        let token3 = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(token3.value.as_identifier(), Some("name"));

        assert!(tokenizer.next_token().unwrap().is_none());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= && || << >> < > & | ! ~ ? :"),
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::LessThanOrEqual,
                Token::GreaterThanOrEqual,
                Token::And,
                Token::Or,
                Token::ShiftLeft,
                Token::ShiftRight,
                Token::LessThan,
                Token::GreaterThan,
                Token::Ampersand,
                Token::Pipe,
                Token::Bang,
                Token::Tilde,
                Token::Question,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_single_equals_is_unknown_operator() {
        assert_eq!(kinds("a = b")[1], Token::Other('='));
    }

    #[test]
    fn test_numbers_keep_dots() {
        assert_eq!(
            kinds("42 2.5 1.2.3"),
            vec![
                Token::Number("42"),
                Token::Number("2.5"),
                Token::Number("1.2.3")
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            kinds(r#"'hello world' "double" 'it\'s' 'a\tb'"#),
            vec![
                Token::String("hello world".to_string()),
                Token::String("double".to_string()),
                Token::String("it's".to_string()),
                Token::String("a\tb".to_string()),
            ]
        );
    }

    #[test]
    fn test_either_quote_escapes_in_both_styles() {
        assert_eq!(
            kinds(r#""it\'s" 'say \"hi\"'"#),
            vec![
                Token::String("it's".to_string()),
                Token::String("say \"hi\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_identifier_shapes() {
        for name in ["a", "_x", "héllo", "true", "a1"] {
            assert!(is_identifier(name), "{name}");
        }
        for name in ["", "1x", "1", "content-type", "a b", "a.b"] {
            assert!(!is_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_numeric_escapes() {
        for source in [r"'\x41'", r"'\101'", r"'\u0041'", r"'\U00000041'"] {
            assert_eq!(kinds(source), vec![Token::String("A".to_string())]);
        }
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r"'bad \q'").unwrap_err();
        assert!(matches!(err, ParseError::InvalidEscape { position: 5, .. }));

        assert!(tokenize(r"'\777'").is_err());
        assert!(tokenize(r"'\uD800'").is_err());
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("'abc").unwrap_err(),
            ParseError::UnclosedString { position: 0 }
        );
        assert!(tokenize(r"'abc\").is_err());
    }

    #[test]
    fn test_unicode_identifiers() {
        assert_eq!(
            kinds("_private héllo"),
            vec![Token::Identifier("_private"), Token::Identifier("héllo")]
        );
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Token::ShiftLeft.to_string(), "<<");
        assert_eq!(Token::Other('@').to_string(), "@");
        assert_eq!(Token::String("x".into()).to_string(), "\"x\"");
    }
}
