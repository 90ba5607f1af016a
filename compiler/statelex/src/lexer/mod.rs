//! State-function driver.
//!
//! A grammar is a graph of [`StateFn`]s. Each state function inspects and
//! advances the [`Lexer`], emits zero or more tokens, and returns the next
//! state, or `None` once the scan is over. The driver never looks inside a
//! state; it only calls the current one and keeps what it returns.
//!
//! Used directly, a [`Lexer`] is the inline driver: [`next_token()`] hands
//! out buffered tokens and, when none are buffered, runs state functions on
//! the caller's stack until one is. The same type runs on the background
//! thread of a [`Scanner`](crate::Scanner), where emitted tokens go to a
//! bounded channel instead of the local buffer.
//!
//! A grammar that needs its own data (nesting depth, a keyword table) keeps
//! it in the lexer's context, `C`. It defaults to `()`; use
//! [`Lexer::with_context`] to supply one and [`Lexer::context_mut`] to reach
//! it from a state function.
//!
//! ```
//! use statelex::{Lexer, StateFn, TokenStream, TokenType};
//!
//! const WORD: TokenType = TokenType::new(0);
//!
//! fn lex_any(l: &mut Lexer<'_>) -> Option<StateFn> {
//!     l.accept_run(' ');
//!     l.ignore();
//!     if l.accept_while(char::is_alphabetic) > 0 {
//!         l.emit(WORD);
//!         return Some(StateFn(lex_any));
//!     }
//!     match l.next() {
//!         None => {
//!             l.emit(TokenType::EOF);
//!             None
//!         }
//!         Some(c) => l.errorf(format_args!("unexpected {c:?}")),
//!     }
//! }
//!
//! let words = Lexer::new("demo", "hi there", StateFn(lex_any)).tokenize()?;
//! assert_eq!(words.len(), 2);
//! # Ok::<(), statelex::ScanError>(())
//! ```
//!
//! [`next_token()`]: Lexer::next_token

use std::collections::VecDeque;
use std::fmt;

use crossbeam::channel::Sender;
use tracing::{debug, trace};

use crate::cursor::{CharSet, Cursor};
use crate::stream::{line_at, TokenStream};
use crate::{Token, TokenType};

/// A state of the scanner, as the function that runs it.
///
/// Returning `None` ends the scan. `C` is the grammar context of the
/// [`Lexer`] the state runs on.
pub struct StateFn<C = ()>(pub for<'a> fn(&mut Lexer<'a, C>) -> Option<StateFn<C>>);

impl<C> StateFn<C> {
    /// Run this state once.
    #[inline]
    pub fn call(self, lexer: &mut Lexer<'_, C>) -> Option<StateFn<C>> {
        (self.0)(lexer)
    }
}

impl<C> Clone for StateFn<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for StateFn<C> {}

impl<C> fmt::Debug for StateFn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateFn")
            .field(&(self.0 as *const ()))
            .finish()
    }
}

/// Where emitted tokens go.
enum Sink {
    /// Inline driver: tokens wait here until `next_token()` takes them.
    Buffer(VecDeque<Token>),
    /// Background driver: tokens are sent to the consumer's `Scanner`.
    Channel(Sender<Token>),
}

/// Error text handed to a state function that asks for the next token.
const REENTRANT: &str = "next_token() called from inside a state function";

/// Scanner state shared by every state function of a scan.
pub struct Lexer<'a, C = ()> {
    /// Used only for diagnostics.
    name: &'a str,
    cursor: Cursor<'a>,
    /// Next state to run; `None` once the chain has ended.
    state: Option<StateFn<C>>,
    sink: Sink,
    context: C,
    /// Set while a state function runs.
    running: bool,
    /// Set once a terminal token was emitted or the consumer went away.
    finished: bool,
    /// Offset of the last token handed to the consumer.
    last_pos: usize,
    /// Terminal token already handed out by the inline driver.
    terminal: Option<Token>,
    emitted: usize,
}

impl<'a, C: Default> Lexer<'a, C> {
    /// Create an inline driver over `input`, starting in `start`.
    pub fn new(name: &'a str, input: &'a str, start: StateFn<C>) -> Self {
        Self::from_bytes(name, input.as_bytes(), start)
    }

    /// Create an inline driver over raw bytes.
    ///
    /// Malformed UTF-8 decodes as one-byte `U+FFFD` characters.
    pub fn from_bytes(name: &'a str, input: &'a [u8], start: StateFn<C>) -> Self {
        Self::with_context(name, input, start, C::default())
    }
}

impl<'a, C> Lexer<'a, C> {
    /// Create an inline driver whose state functions share `context`.
    pub fn with_context(
        name: &'a str,
        input: &'a (impl AsRef<[u8]> + ?Sized),
        start: StateFn<C>,
        context: C,
    ) -> Self {
        let sink = Sink::Buffer(VecDeque::new());
        Self::with_sink(name, input.as_ref(), start, sink, context)
    }

    /// Create a driver that sends every token to `tokens`.
    pub(crate) fn with_channel(
        name: &'a str,
        input: &'a [u8],
        start: StateFn<C>,
        tokens: Sender<Token>,
        context: C,
    ) -> Self {
        Self::with_sink(name, input, start, Sink::Channel(tokens), context)
    }

    fn with_sink(
        name: &'a str,
        input: &'a [u8],
        start: StateFn<C>,
        sink: Sink,
        context: C,
    ) -> Self {
        debug!(name, len = input.len(), "scan created");
        Lexer {
            name,
            cursor: Cursor::new(input),
            state: Some(start),
            sink,
            context,
            running: false,
            finished: false,
            last_pos: 0,
            terminal: None,
            emitted: 0,
        }
    }

    // ─── Driving ─────────────────────────────────────────────────────────

    /// Run state functions until the chain ends.
    ///
    /// Used by the background thread; blocks whenever the channel is full.
    pub(crate) fn run(&mut self) {
        while self.step() {}
        self.finish();
    }

    /// Run the current state once. Returns `false` if nothing is left to run.
    fn step(&mut self) -> bool {
        if self.finished {
            return false;
        }
        match self.state.take() {
            Some(state) => {
                self.running = true;
                self.state = state.call(self);
                self.running = false;
                true
            }
            None => false,
        }
    }

    /// End a state chain that never emitted a terminal token.
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        debug!(
            name = self.name,
            pos = self.cursor.pos(),
            "state chain ended without a terminal token"
        );
        self.deliver(Token::eof(self.cursor.pos()));
    }

    fn deliver(&mut self, token: Token) {
        if self.finished {
            debug!(
                name = self.name,
                pos = token.pos,
                "token emitted after the scan ended, dropped"
            );
            return;
        }
        trace!(typ = token.typ.raw(), pos = token.pos, len = token.text.len(), "emit");
        self.emitted += 1;
        if token.is_terminal() {
            self.finished = true;
            debug!(name = self.name, tokens = self.emitted, "scan finished");
        }
        match &mut self.sink {
            Sink::Buffer(buffer) => buffer.push_back(token),
            Sink::Channel(tokens) => {
                let pos = token.pos;
                if tokens.send(token).is_err() {
                    debug!(name = self.name, "consumer dropped, stopping scan");
                    self.finished = true;
                } else {
                    self.last_pos = pos;
                }
            }
        }
    }

    fn pop_buffered(&mut self) -> Option<Token> {
        match &mut self.sink {
            Sink::Buffer(buffer) => buffer.pop_front(),
            Sink::Channel(_) => None,
        }
    }

    /// Returns the next token, running state functions until one exists.
    ///
    /// This is the consumer's call. A state function that calls it gets an
    /// error token back and the scan itself is left untouched.
    pub fn next_token(&mut self) -> Token {
        if self.running {
            debug!(name = self.name, "next_token() called from a state function, refused");
            return Token::error(REENTRANT, self.cursor.start());
        }
        loop {
            if let Some(token) = self.pop_buffered() {
                self.last_pos = token.pos;
                if token.is_terminal() {
                    self.terminal = Some(token.clone());
                }
                return token;
            }
            if let Some(terminal) = &self.terminal {
                return terminal.clone();
            }
            if !self.step() {
                self.finish();
                if !self.has_buffered() {
                    // A channel driver keeps nothing locally.
                    return Token::eof(self.cursor.pos());
                }
            }
        }
    }

    fn has_buffered(&self) -> bool {
        match &self.sink {
            Sink::Buffer(buffer) => !buffer.is_empty(),
            Sink::Channel(_) => false,
        }
    }

    /// 1-based line number of the last token handed to the consumer.
    ///
    /// Counts newlines from the start of the input on every call.
    pub fn line_number(&self) -> usize {
        line_at(self.cursor.input(), self.last_pos)
    }

    // ─── Emission ────────────────────────────────────────────────────────

    /// Emit the pending text as a token of type `typ`.
    pub fn emit(&mut self, typ: TokenType) {
        let (start, text) = self.cursor.take_pending();
        self.deliver(Token::new(typ, text.into_owned(), start));
    }

    /// Emit an error token and end the scan.
    ///
    /// The token text is the formatted message and its position is the
    /// start of the pending token. Returns `None` so a state function can
    /// end with `return l.errorf(format_args!(..))`.
    pub fn errorf(&mut self, args: fmt::Arguments<'_>) -> Option<StateFn<C>> {
        let message = fmt::format(args);
        debug!(name = self.name, pos = self.cursor.start(), %message, "scan error");
        self.deliver(Token::error(message, self.cursor.start()));
        None
    }

    // ─── Cursor ──────────────────────────────────────────────────────────

    /// See [`Cursor::next`].
    #[inline]
    #[allow(
        clippy::should_implement_trait,
        reason = "single-step decode with backtracking, not an iterator"
    )]
    pub fn next(&mut self) -> Option<char> {
        self.cursor.next()
    }

    /// See [`Cursor::backup`].
    #[inline]
    pub fn backup(&mut self) {
        self.cursor.backup();
    }

    /// See [`Cursor::peek`].
    #[inline]
    pub fn peek(&mut self) -> Option<char> {
        self.cursor.peek()
    }

    /// See [`Cursor::accept`].
    #[inline]
    pub fn accept(&mut self, valid: impl CharSet) -> bool {
        self.cursor.accept(valid)
    }

    /// See [`Cursor::accept_run`].
    #[inline]
    pub fn accept_run(&mut self, valid: impl CharSet) -> usize {
        self.cursor.accept_run(valid)
    }

    /// See [`Cursor::accept_if`].
    #[inline]
    pub fn accept_if(&mut self, pred: impl Fn(char) -> bool) -> bool {
        self.cursor.accept_if(pred)
    }

    /// See [`Cursor::accept_while`].
    #[inline]
    pub fn accept_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        self.cursor.accept_while(pred)
    }

    /// See [`Cursor::ignore`].
    #[inline]
    pub fn ignore(&mut self) {
        self.cursor.ignore();
    }

    /// Read access to the cursor (offsets, width, pending text).
    #[inline]
    pub fn cursor(&self) -> &Cursor<'a> {
        &self.cursor
    }

    /// Mutable cursor, e.g. to restore a snapshot.
    #[inline]
    pub fn cursor_mut(&mut self) -> &mut Cursor<'a> {
        &mut self.cursor
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    // ─── Context ─────────────────────────────────────────────────────────

    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consume the lexer, returning the grammar context.
    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C> TokenStream for Lexer<'_, C> {
    fn name(&self) -> &str {
        self.name
    }

    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }

    fn line_number(&self) -> usize {
        Lexer::line_number(self)
    }
}

impl<C> fmt::Debug for Lexer<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("name", &self.name)
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .field("finished", &self.finished)
            .field("last_pos", &self.last_pos)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
