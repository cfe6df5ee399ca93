//! Length-prefixed framing.
//!
//! ```text
//! [0..2] : payload length (u16 BE)
//! [2..]  : payload (UTF-8, exactly `length` bytes)
//! ```
//!
//! A zero length is a valid, empty message.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::wire_types::{LENGTH_PREFIX_LEN, MAX_MESSAGE_LEN};

/// Encode a single message into a frame appended to `out`.
pub fn encode_message(message: &str, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let payload = message.as_bytes();
    let len = u16::try_from(payload.len()).map_err(|_| ProtocolError::MessageTooLong {
        len: payload.len(),
        max: MAX_MESSAGE_LEN,
    })?;

    out.reserve(LENGTH_PREFIX_LEN + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);

    Ok(())
}

/// Decode one frame from the front of `buf`.
///
/// Leaves `buf` untouched and returns `Ok(None)` if the frame is not
/// complete yet.
pub fn decode_message(buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }

    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    let frame_len = LENGTH_PREFIX_LEN + len;
    if buf.len() < frame_len {
        buf.reserve(frame_len - buf.len());
        return Ok(None);
    }

    buf.advance(LENGTH_PREFIX_LEN);
    let payload = buf.split_to(len);
    let text = std::str::from_utf8(&payload)?;

    Ok(Some(text.to_owned()))
}

/// End-of-stream variant: a truncated trailing frame is dropped.
pub fn decode_message_eof(buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    match decode_message(buf)? {
        Some(message) => Ok(Some(message)),
        None => {
            buf.clear();
            Ok(None)
        }
    }
}
