//! Async framing on top of `relay-protocol`.
//!
//! [`MessageReader`] accumulates bytes from any `AsyncRead` half into a
//! `BytesMut` and hands out one decoded message at a time. The write side
//! is a pair of free functions; the registry uses [`write_frame`] so a
//! broadcast encodes the message only once.

use std::io;

use bytes::BytesMut;
use relay_protocol::{Framing, ProtocolError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const READ_BUFFER_CAPACITY: usize = 4096;

/// Reads framed messages from one inbound stream.
pub struct MessageReader<R> {
    inner: R,
    buffer: BytesMut,
    framing: Framing,
}

impl<R> MessageReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R, framing: Framing) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            framing,
        }
    }

    /// Read the next message.
    ///
    /// - `Ok(Some(msg))`: one complete message.
    /// - `Ok(None)`: the peer closed the stream cleanly.
    /// - `Err(_)`: transport failure, or a frame that is not valid
    ///   (mapped to `ErrorKind::InvalidData`).
    ///
    /// Cancel safe: bytes already read stay buffered for the next call.
    pub async fn read_message(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(message) = self.framing.decode(&mut self.buffer).map_err(to_io_error)? {
                return Ok(Some(message));
            }

            let n = self.inner.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if !self.buffer.is_empty() {
                    debug!(
                        pending = self.buffer.len(),
                        framing = %self.framing,
                        "stream closed with buffered bytes"
                    );
                }
                return self.framing.decode_eof(&mut self.buffer).map_err(to_io_error);
            }
        }
    }
}

/// Encode `message` and write it as one frame.
pub async fn write_message<W>(writer: &mut W, framing: Framing, message: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = Vec::with_capacity(message.len() + 2);
    framing.encode(message, &mut frame).map_err(to_io_error)?;
    write_frame(writer, &frame).await
}

/// Write an already encoded frame and flush so peers see it promptly.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await
}

fn to_io_error(err: ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
