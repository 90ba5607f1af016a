//! Tokens produced by the scanning engine.
//!
//! The engine has no token catalog of its own. A [`TokenType`] is an opaque
//! integer tag: the two negative values are reserved for end of input and
//! errors, every non-negative value belongs to the grammar.

use std::fmt;

/// Type tag of a [`Token`].
///
/// Grammars usually define their kinds as associated constants:
///
/// ```
/// use statelex::TokenType;
///
/// const NUMBER: TokenType = TokenType::new(1);
/// const OPERATOR: TokenType = TokenType::new(2);
/// # assert_ne!(NUMBER, OPERATOR);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenType(pub i32);

impl TokenType {
    /// End of input. Its token has empty text at the final offset.
    pub const EOF: TokenType = TokenType(-1);

    /// Scan error. Its token text is the error message.
    pub const ERROR: TokenType = TokenType(-2);

    /// Wrap a raw tag.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        TokenType(raw)
    }

    /// Returns the raw integer tag.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns `true` for [`EOF`](Self::EOF) and [`ERROR`](Self::ERROR).
    ///
    /// A terminal token is the last token a scan ever delivers.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.0 == Self::EOF.0 || self.0 == Self::ERROR.0
    }
}

impl From<i32> for TokenType {
    fn from(raw: i32) -> Self {
        TokenType(raw)
    }
}

/// A token returned from the scanner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    /// Type tag, such as a grammar's `NUMBER`.
    pub typ: TokenType,
    /// Source text covered by the token, or the message of an error token.
    pub text: String,
    /// Byte offset of the token start in the input.
    pub pos: usize,
}

impl Token {
    /// Create a token.
    pub fn new(typ: TokenType, text: impl Into<String>, pos: usize) -> Self {
        Token {
            typ,
            text: text.into(),
            pos,
        }
    }

    /// End-of-input token at `pos` with empty text.
    pub fn eof(pos: usize) -> Self {
        Token::new(TokenType::EOF, String::new(), pos)
    }

    /// Error token carrying `message` at `pos`.
    pub fn error(message: impl Into<String>, pos: usize) -> Self {
        Token::new(TokenType::ERROR, message, pos)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.typ == TokenType::EOF
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.typ == TokenType::ERROR
    }

    /// See [`TokenType::is_terminal`].
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.typ.is_terminal()
    }
}

/// Number of characters shown before a long token is elided.
const DISPLAY_LIMIT: usize = 10;

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            TokenType::EOF => f.write_str("EOF"),
            TokenType::ERROR => f.write_str(&self.text),
            _ => match self.text.char_indices().nth(DISPLAY_LIMIT) {
                Some((cut, _)) => write!(f, "{:?}...", &self.text[..cut]),
                None => write!(f, "{:?}", self.text),
            },
        }
    }
}
