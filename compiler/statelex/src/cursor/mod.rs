//! Rune cursor over the scan input.
//!
//! The cursor decodes one code point at a time and remembers the byte width
//! of the last decode, which allows exactly one step of backtracking. Two
//! offsets are tracked: `start`, where the pending token begins, and `pos`,
//! where the next decode happens. `start <= pos <= input.len()` holds
//! between primitives, except that `ignore()` followed by `backup()` leaves
//! `start` one code point past `pos`. The pending text is then empty and
//! starts at `pos`.
//!
//! # Malformed input
//!
//! Input built from a `&str` is always valid UTF-8. Byte input may contain
//! malformed sequences: each one decodes as [`char::REPLACEMENT_CHARACTER`]
//! with a width of one byte, so the cursor always makes progress and offsets
//! advance one byte per bad byte.

use std::borrow::Cow;
use std::ops::RangeInclusive;

/// Longest UTF-8 encoding of a single code point.
const MAX_UTF8_LEN: usize = 4;

/// A set of acceptable characters for [`Cursor::accept`] and
/// [`Cursor::accept_run`].
///
/// Implemented for strings (any character of the string), single
/// characters, character slices and arrays, and inclusive ranges.
pub trait CharSet {
    /// Returns `true` if `c` belongs to the set.
    fn contains_char(&self, c: char) -> bool;
}

impl CharSet for str {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(c)
    }
}

impl CharSet for char {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        *self == c
    }
}

impl CharSet for [char] {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(&c)
    }
}

impl<const N: usize> CharSet for [char; N] {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(&c)
    }
}

impl CharSet for RangeInclusive<char> {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(&c)
    }
}

impl<T: CharSet + ?Sized> CharSet for &T {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        (**self).contains_char(c)
    }
}

/// Decode the code point at the front of `bytes`.
///
/// Returns `None` for empty input. Malformed sequences decode as
/// `U+FFFD` with width 1.
#[inline]
fn decode(bytes: &[u8]) -> Option<(char, usize)> {
    let window = &bytes[..bytes.len().min(MAX_UTF8_LEN)];
    let chunk = window.utf8_chunks().next()?;
    match chunk.valid().chars().next() {
        Some(c) => Some((c, c.len_utf8())),
        None => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

/// Cursor over the input of a single scan.
///
/// The cursor is [`Copy`], so a state function can snapshot it and restore
/// the snapshot for lookahead deeper than one code point.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    /// Start of the pending token.
    start: usize,
    /// Offset of the next decode.
    pos: usize,
    /// Byte width of the last decode; zero at end of input.
    width: usize,
    /// Set by `backup()`, cleared by the next decode.
    backed_up: bool,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at offset 0.
    pub fn new(input: &'a [u8]) -> Self {
        Cursor {
            input,
            start: 0,
            pos: 0,
            width: 0,
            backed_up: false,
        }
    }

    /// Decode and consume the next code point.
    ///
    /// Returns `None` at end of input and records a width of zero, so a
    /// following [`backup()`](Self::backup) is a no-op.
    #[inline]
    #[allow(
        clippy::should_implement_trait,
        reason = "single-step decode with backtracking, not an iterator"
    )]
    pub fn next(&mut self) -> Option<char> {
        self.backed_up = false;
        match decode(&self.input[self.pos..]) {
            Some((c, width)) => {
                self.width = width;
                self.pos += width;
                Some(c)
            }
            None => {
                self.width = 0;
                None
            }
        }
    }

    /// Step back over the last decoded code point.
    ///
    /// # Contract
    ///
    /// Valid once per [`next()`](Self::next). Two consecutive calls without
    /// an intervening decode are a caller error (asserted in debug builds).
    #[inline]
    pub fn backup(&mut self) {
        debug_assert!(!self.backed_up, "backup() called twice without a decode");
        self.backed_up = true;
        self.pos = self.pos.saturating_sub(self.width);
    }

    /// Returns the next code point without consuming it.
    #[inline]
    pub fn peek(&mut self) -> Option<char> {
        let c = self.next();
        self.backup();
        c
    }

    /// Consume the next code point if it belongs to `valid`.
    pub fn accept(&mut self, valid: impl CharSet) -> bool {
        self.accept_if(|c| valid.contains_char(c))
    }

    /// Consume a run of code points from `valid`.
    ///
    /// Leaves `pos` just past the last matching character and returns the
    /// number of characters consumed.
    pub fn accept_run(&mut self, valid: impl CharSet) -> usize {
        self.accept_while(|c| valid.contains_char(c))
    }

    /// Consume the next code point if it satisfies `pred`.
    pub fn accept_if(&mut self, pred: impl Fn(char) -> bool) -> bool {
        if self.next().is_some_and(&pred) {
            return true;
        }
        self.backup();
        false
    }

    /// Consume code points while they satisfy `pred`.
    pub fn accept_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.next().is_some_and(&pred) {
            count += 1;
        }
        self.backup();
        count
    }

    /// Discard the pending text.
    #[inline]
    pub fn ignore(&mut self) {
        self.start = self.pos;
    }

    /// Returns the pending token's start offset and text, and starts a new
    /// pending token at `pos`.
    pub(crate) fn take_pending(&mut self) -> (usize, Cow<'a, str>) {
        let start = self.start.min(self.pos);
        let text = self.pending();
        self.start = self.pos;
        (start, text)
    }

    /// Text between `start` and `pos`; empty if `start` is past `pos`.
    pub fn pending(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(&self.input[self.start.min(self.pos)..self.pos])
    }

    /// Start offset of the pending token.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Current scan offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte width of the last decoded code point.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns `true` when no input remains at `pos`.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The whole scan input.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }
}
