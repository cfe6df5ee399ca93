//! Newline-delimited framing.
//!
//! Each message is one line of UTF-8 text ending in `\n`. A `\r` right
//! before the `\n` is stripped, so `nc -C` and telnet sessions work.
//! Blank lines carry no message and are skipped. This differs from
//! length framing, where an empty message is a valid frame: a
//! line-framed client cannot send `""`, and an empty broadcast reaches
//! line-framed clients as a bare `\n`.

use bytes::BytesMut;

use crate::error::ProtocolError;
use crate::wire_types::MAX_LINE_LEN;

/// Encode a single message as one `\n`-terminated line.
pub fn encode_line(message: &str, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    if message.contains('\n') {
        return Err(ProtocolError::EmbeddedNewline);
    }
    if message.len() > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN });
    }

    out.reserve(message.len() + 1);
    out.extend_from_slice(message.as_bytes());
    out.push(b'\n');

    Ok(())
}

/// Decode the next non-blank line from `buf`.
pub fn decode_line(buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    loop {
        let Some(newline_pos) = buf.iter().position(|&b| b == b'\n') else {
            if buf.len() > MAX_LINE_LEN {
                return Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN });
            }
            return Ok(None);
        };

        let line = buf.split_to(newline_pos + 1);
        let text = trim_line_ending(&line);
        if text.is_empty() {
            continue;
        }
        if text.len() > MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN });
        }

        return Ok(Some(std::str::from_utf8(text)?.to_owned()));
    }
}

/// End-of-stream variant: an unterminated trailing line is still a message.
pub fn decode_line_eof(buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    if let Some(line) = decode_line(buf)? {
        return Ok(Some(line));
    }

    let rest = buf.split();
    let text = trim_line_ending(&rest);
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(std::str::from_utf8(text)?.to_owned()))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
