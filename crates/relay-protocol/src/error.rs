//! Error types for the framing layer.

use thiserror::Error;

/// Errors that can arise when encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload does not fit in the `u16` length prefix.
    #[error("message of {len} bytes exceeds the {max} byte frame limit")]
    MessageTooLong { len: usize, max: usize },

    /// A line grew past the limit without a terminator.
    #[error("line exceeds the {max} byte limit")]
    LineTooLong { max: usize },

    /// Line framing cannot carry a message that contains `\n`.
    #[error("message contains a line break and cannot be line framed")]
    EmbeddedNewline,

    /// Payload bytes are not valid UTF-8.
    #[error("invalid UTF-8 in message: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Returned when a framing name is not recognised.
#[derive(Debug, Error)]
#[error("unknown framing {0:?} (expected `length` or `line`)")]
pub struct ParseFramingError(pub String);
