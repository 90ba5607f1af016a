//! Background scanner.
//!
//! [`Scanner::spawn`] starts one thread per scan. The thread owns a
//! [`Lexer`] and runs its state functions to completion, sending every token
//! over a bounded channel. The send is the thread's only suspension point:
//! with the default capacity of two, the producer runs at most a couple of
//! tokens ahead of the consumer.
//!
//! Dropping the [`Scanner`] disconnects the channel. The producer notices on
//! its next send and exits.

use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, Receiver};
use tracing::{debug, debug_span};

use crate::lexer::{Lexer, StateFn};
use crate::stream::{line_at, TokenStream};
use crate::{ScanError, Token};

/// Default number of tokens buffered between producer and consumer.
pub const DEFAULT_CAPACITY: usize = 2;

/// Error text for a producer that stopped without a terminal token.
const PRODUCER_LOST: &str = "scanner thread terminated before end of input";

/// Configuration for a [`Scanner`].
///
/// ```
/// use statelex::{Lexer, Scanner, StateFn, TokenType};
///
/// fn lex_all(l: &mut Lexer<'_>) -> Option<StateFn> {
///     l.accept_while(|_| true);
///     l.emit(TokenType::new(0));
///     l.emit(TokenType::EOF);
///     None
/// }
///
/// let mut scanner = Scanner::builder("config.ini")
///     .capacity(8)
///     .thread_name("ini-scanner")
///     .spawn("key = value", StateFn(lex_all))?;
/// assert_eq!(scanner.next_token().text, "key = value");
/// # Ok::<(), statelex::ScanError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ScannerBuilder {
    name: String,
    capacity: usize,
    thread_name: Option<String>,
}

impl ScannerBuilder {
    fn new(name: String) -> Self {
        ScannerBuilder {
            name,
            capacity: DEFAULT_CAPACITY,
            thread_name: None,
        }
    }

    /// Number of tokens the channel holds before the producer blocks.
    ///
    /// Zero makes every token a direct handoff.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Name of the background thread. Defaults to `statelex:<name>`.
    #[must_use]
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    /// Start scanning `input` from `start` on a new thread.
    pub fn spawn<C>(
        self,
        input: impl Into<Vec<u8>>,
        start: StateFn<C>,
    ) -> Result<Scanner, ScanError>
    where
        C: Default + Send + 'static,
    {
        self.spawn_with_context(input, start, C::default())
    }

    /// Like [`spawn`](Self::spawn), with `context` moved to the scanning
    /// thread as the grammar context. It is dropped there when the scan
    /// ends.
    pub fn spawn_with_context<C>(
        self,
        input: impl Into<Vec<u8>>,
        start: StateFn<C>,
        context: C,
    ) -> Result<Scanner, ScanError>
    where
        C: Send + 'static,
    {
        let input: Vec<u8> = input.into();
        let input: Arc<[u8]> = Arc::from(input);
        let (sender, receiver) = bounded(self.capacity);
        let thread_name = self
            .thread_name
            .unwrap_or_else(|| format!("statelex:{}", self.name));

        let worker_name = self.name.clone();
        let worker_input = Arc::clone(&input);
        let spawned = thread::Builder::new().name(thread_name).spawn(move || {
            let span = debug_span!("scan", name = %worker_name);
            let _guard = span.enter();
            let mut lexer = Lexer::with_channel(&worker_name, &worker_input, start, sender, context);
            lexer.run();
        });
        if let Err(source) = spawned {
            return Err(ScanError::Spawn {
                name: self.name,
                source,
            });
        }

        debug!(name = %self.name, capacity = self.capacity, "scanner thread started");
        Ok(Scanner {
            name: self.name,
            input,
            receiver,
            last_pos: 0,
            terminal: None,
        })
    }
}

/// Handle to a scan running on a background thread.
#[derive(Debug)]
pub struct Scanner {
    name: String,
    /// Shared with the producer; used here for line numbers.
    input: Arc<[u8]>,
    receiver: Receiver<Token>,
    last_pos: usize,
    terminal: Option<Token>,
}

impl Scanner {
    /// Configure a scan before spawning it.
    pub fn builder(name: impl Into<String>) -> ScannerBuilder {
        ScannerBuilder::new(name.into())
    }

    /// Start scanning `input` from `start` with the default configuration.
    pub fn spawn<C>(
        name: impl Into<String>,
        input: impl Into<Vec<u8>>,
        start: StateFn<C>,
    ) -> Result<Scanner, ScanError>
    where
        C: Default + Send + 'static,
    {
        Self::builder(name).spawn(input, start)
    }

    /// Returns the next token, blocking until the producer sends one.
    pub fn next_token(&mut self) -> Token {
        if let Some(terminal) = &self.terminal {
            return terminal.clone();
        }
        let token = match self.receiver.recv() {
            Ok(token) => token,
            Err(_) => {
                debug!(name = %self.name, "producer disconnected without a terminal token");
                Token::error(PRODUCER_LOST, self.last_pos)
            }
        };
        self.last_pos = token.pos;
        if token.is_terminal() {
            self.terminal = Some(token.clone());
        }
        token
    }

    /// 1-based line number of the last token returned by
    /// [`next_token()`](Self::next_token).
    pub fn line_number(&self) -> usize {
        line_at(&self.input, self.last_pos)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TokenStream for Scanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_token(&mut self) -> Token {
        Scanner::next_token(self)
    }

    fn line_number(&self) -> usize {
        Scanner::line_number(self)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
