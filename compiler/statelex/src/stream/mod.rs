//! Consumer side of a scan.
//!
//! [`TokenStream`] is the seam shared by the inline [`Lexer`] and the
//! threaded [`Scanner`]: pull one token at a time until a terminal token
//! arrives.
//!
//! [`Lexer`]: crate::Lexer
//! [`Scanner`]: crate::Scanner

use crate::{ScanError, Token};

/// A pull-based, ordered stream of tokens ending in a terminal token.
pub trait TokenStream {
    /// Diagnostic name of the scan.
    fn name(&self) -> &str;

    /// Returns the next token.
    ///
    /// Once an end-of-input or error token has been returned, every further
    /// call returns that same terminal token again.
    fn next_token(&mut self) -> Token;

    /// 1-based line number of the last token returned by
    /// [`next_token()`](Self::next_token).
    fn line_number(&self) -> usize;

    /// Iterate over the remaining tokens.
    ///
    /// The terminal token is yielded once, after which the iterator is
    /// exhausted.
    fn tokens(&mut self) -> Tokens<'_, Self>
    where
        Self: Sized,
    {
        Tokens {
            stream: self,
            done: false,
        }
    }

    /// Drain the stream.
    ///
    /// Returns every token before end of input, or the error token as a
    /// [`ScanError::Lexical`]. Tokens emitted before an error are discarded
    /// with the `Err`.
    fn tokenize(mut self) -> Result<Vec<Token>, ScanError>
    where
        Self: Sized,
    {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.is_eof() {
                return Ok(tokens);
            }
            if token.is_error() {
                let line = self.line_number();
                return Err(ScanError::lexical(self.name(), token, line));
            }
            tokens.push(token);
        }
    }
}

/// Iterator returned by [`TokenStream::tokens`].
pub struct Tokens<'s, S> {
    stream: &'s mut S,
    done: bool,
}

impl<S: TokenStream> Iterator for Tokens<'_, S> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.stream.next_token();
        self.done = token.is_terminal();
        Some(token)
    }
}

impl<S: TokenStream> std::iter::FusedIterator for Tokens<'_, S> {}

/// 1-based line containing byte offset `pos`.
pub(crate) fn line_at(input: &[u8], pos: usize) -> usize {
    let end = pos.min(input.len());
    memchr::memchr_iter(b'\n', &input[..end]).count() + 1
}
