//! Two-token lookahead window over the tokenizer

use super::error::ParseResult;
use super::span::Spanned;
use super::tokenizer::{Token, Tokenizer};

/// Holds the current token and the one after it
///
/// `None` in either slot means end of input. Lexer errors surface from
/// [`TokenCursor::advance`] as soon as the failing token enters the window.
pub struct TokenCursor<'input> {
    tokenizer: Tokenizer<'input>,
    current: Option<Spanned<Token<'input>>>,
    next: Option<Spanned<Token<'input>>>,
}

impl<'input> TokenCursor<'input> {
    /// Prime the window with the first two tokens of `input`
    pub fn new(input: &'input str) -> ParseResult<Self> {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token()?;
        let next = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            current,
            next,
        })
    }

    /// Current token, if any
    #[inline]
    pub fn current(&self) -> Option<&Token<'input>> {
        self.current.as_ref().map(|spanned| &spanned.value)
    }

    /// Token after the current one, if any
    #[inline]
    pub fn peek(&self) -> Option<&Token<'input>> {
        self.next.as_ref().map(|spanned| &spanned.value)
    }

    /// Byte offset of the current token, or end of input
    pub fn position(&self) -> usize {
        self.current
            .as_ref()
            .map_or_else(|| self.tokenizer.position(), |spanned| spanned.start)
    }

    /// Check whether the current token equals `expected`
    #[inline]
    pub fn at(&self, expected: &Token<'_>) -> bool {
        self.current() == Some(expected)
    }

    /// True when the window has run out of tokens
    pub fn is_at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Shift the window by one, returning the token that was current
    pub fn advance(&mut self) -> ParseResult<Option<Spanned<Token<'input>>>> {
        let following = if self.next.is_some() {
            self.tokenizer.next_token()?
        } else {
            None
        };
        let taken = std::mem::replace(&mut self.current, self.next.take());
        self.next = following;
        Ok(taken)
    }
}
