//! relay-protocol
//!
//! Wire-level framing for the chat relay.
//!
//! A chat message is an opaque UTF-8 string. This crate is responsible
//! for turning one message into bytes and for cutting messages back out
//! of a byte stream:
//!
//! - [`length_codec`] : `u16` big-endian length prefix + UTF-8 payload
//! - [`line_codec`]   : newline-delimited UTF-8 (netcat friendly)
//! - [`wire_types`]   : the [`Framing`] selector and wire constants

pub mod error;
pub mod length_codec;
pub mod line_codec;
pub mod wire_types;

pub use error::{ParseFramingError, ProtocolError};
pub use wire_types::{Framing, LENGTH_PREFIX_LEN, MAX_LINE_LEN, MAX_MESSAGE_LEN};
