//! Wire constants and the framing selector.
//!
//! The relay speaks exactly one framing per server, chosen at startup.
//! Clients and server must agree on it; nothing on the wire announces
//! which one is in use.

use std::fmt;
use std::str::FromStr;

use bytes::BytesMut;

use crate::error::{ParseFramingError, ProtocolError};
use crate::{length_codec, line_codec};

/// Size of the big-endian length prefix in front of every
/// length-framed message.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Largest payload a length-framed message can carry.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// Largest line accepted before the reader gives up waiting for `\n`.
pub const MAX_LINE_LEN: usize = u16::MAX as usize;

/// How messages are delimited on the byte stream.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Framing {
    /// `[len: u16 BE][len bytes of UTF-8]`.
    #[default]
    LengthPrefixed,

    /// UTF-8 text terminated by `\n` (`\r\n` accepted).
    Line,
}

impl Framing {
    /// Encode one message, appending the frame to `out`.
    pub fn encode(self, message: &str, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
        match self {
            Framing::LengthPrefixed => length_codec::encode_message(message, out),
            Framing::Line => line_codec::encode_line(message, out),
        }
    }

    /// Decode the next complete message from `buf`, consuming its bytes.
    ///
    /// Returns `Ok(None)` when `buf` does not hold a full frame yet.
    pub fn decode(self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match self {
            Framing::LengthPrefixed => length_codec::decode_message(buf),
            Framing::Line => line_codec::decode_line(buf),
        }
    }

    /// Like [`Framing::decode`], but called once the peer has closed its
    /// side of the stream and no more bytes will arrive.
    pub fn decode_eof(self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match self {
            Framing::LengthPrefixed => length_codec::decode_message_eof(buf),
            Framing::Line => line_codec::decode_line_eof(buf),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Framing::LengthPrefixed => "length",
            Framing::Line => "line",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framing {
    type Err = ParseFramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" | "length-prefixed" => Ok(Framing::LengthPrefixed),
            "line" | "lines" => Ok(Framing::Line),
            _ => Err(ParseFramingError(s.to_string())),
        }
    }
}
