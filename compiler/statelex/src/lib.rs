//! Generic state-function lexical scanner.
//!
//! A grammar is written as a set of [`StateFn`]s. Each one reads input
//! through the [`Lexer`]'s cursor primitives ([`next`], [`backup`],
//! [`peek`], [`accept`], [`accept_run`], [`ignore`]), emits tokens with
//! [`emit`] or ends the scan with [`errorf`], and returns the next state.
//! The engine has no grammar of its own. Data a grammar needs between
//! states lives in the lexer's context ([`Lexer::context_mut`]).
//!
//! Two drivers run a grammar:
//!
//! - [`Lexer`] runs state functions inline, only when [`next_token()`] finds
//!   no buffered token.
//! - [`Scanner`] runs them on a background thread and hands tokens over a
//!   bounded channel.
//!
//! Both implement [`TokenStream`]. Every scan ends with exactly one
//! terminal token: [`TokenType::EOF`] or [`TokenType::ERROR`].
//!
//! [`next`]: Lexer::next
//! [`backup`]: Lexer::backup
//! [`peek`]: Lexer::peek
//! [`accept`]: Lexer::accept
//! [`accept_run`]: Lexer::accept_run
//! [`ignore`]: Lexer::ignore
//! [`emit`]: Lexer::emit
//! [`errorf`]: Lexer::errorf
//! [`next_token()`]: TokenStream::next_token

mod cursor;
mod error;
mod lexer;
mod scanner;
mod stream;
mod token;

pub use cursor::{CharSet, Cursor};
pub use error::ScanError;
pub use lexer::{Lexer, StateFn};
pub use scanner::{Scanner, ScannerBuilder, DEFAULT_CAPACITY};
pub use stream::{TokenStream, Tokens};
pub use token::{Token, TokenType};
