//! The callback protocol a structural tokenizer drives.
//!
//! A tokenizer walks the byte stream once and reports every primitive and
//! every structural boundary through these callbacks, in document order.
//! Returning `Err` stops the tokenizer; the error is surfaced unchanged.

use crate::error::{Error, Result};

/// Receiver of a structural token feed.
pub trait TokenSink {
    /// A `null` literal.
    fn null(&mut self) -> Result<()>;

    /// `true` or `false`.
    fn boolean(&mut self, value: bool) -> Result<()>;

    /// A negative integer.
    fn integer(&mut self, value: i64) -> Result<()>;

    /// A non-negative integer.
    fn unsigned(&mut self, value: u64) -> Result<()>;

    /// A number with a fraction or exponent.
    ///
    /// `raw` is the shortest text that reads back as `value`, not the bytes
    /// of the input: `1e3` arrives as `"1000"`.
    fn float(&mut self, value: f64, raw: &str) -> Result<()>;

    /// A string value (not a key).
    fn string(&mut self, value: String) -> Result<()>;

    /// `{`. The hint is the member count when the tokenizer knows it.
    fn start_object(&mut self, size_hint: Option<usize>) -> Result<()>;

    /// `}`.
    fn end_object(&mut self) -> Result<()>;

    /// `[`. The hint is the element count when the tokenizer knows it.
    fn start_array(&mut self, size_hint: Option<usize>) -> Result<()>;

    /// `]`.
    fn end_array(&mut self) -> Result<()>;

    /// An object key; always followed by exactly one value.
    fn key(&mut self, key: String) -> Result<()>;

    /// The tokenizer hit malformed input at byte `position`.
    ///
    /// Returns the error to surface. Sinks may override this to discard
    /// partial state first.
    fn parse_error(&mut self, position: u64, last_token: &str, cause: &str) -> Error {
        Error::Syntax {
            offset: position,
            last_token: last_token.to_string(),
            message: cause.to_string(),
        }
    }
}
