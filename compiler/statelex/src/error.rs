//! Errors surfaced to callers outside the token stream.
//!
//! A scan itself has one failure mode: an error token emitted by a state
//! function. [`ScanError::Lexical`] lifts that token into a `Result` for
//! callers who drain a stream with [`TokenStream::tokenize`]. Starting the
//! background scanner thread is the only operation that can fail before any
//! token exists.
//!
//! [`TokenStream::tokenize`]: crate::TokenStream::tokenize

use std::io;

use thiserror::Error;

use crate::Token;

/// Error returned by the fallible scanner entry points.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The background scanner thread could not be started.
    #[error("failed to spawn scanner thread for `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A state function terminated the scan with an error token.
    #[error("{name}:{line}: {message}")]
    Lexical {
        name: String,
        message: String,
        /// Byte offset where the failing token began.
        pos: usize,
        /// 1-based line of `pos`.
        line: usize,
    },
}

impl ScanError {
    /// Build a [`ScanError::Lexical`] from an error token.
    pub(crate) fn lexical(name: &str, token: Token, line: usize) -> Self {
        debug_assert!(token.is_error(), "lexical error from non-error token");
        ScanError::Lexical {
            name: name.to_owned(),
            message: token.text,
            pos: token.pos,
            line,
        }
    }
}
