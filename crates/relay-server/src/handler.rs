//! Per-connection read loop.
//!
//! Every accepted connection gets one `ConnectionHandler` running on its
//! own task. It reads messages in order and hands each one to
//! `Server::send_all`, so the sender hears its own message too. When the
//! stream ends, cleanly or not, the handler removes its connection from
//! the registry exactly once and returns.

use std::io;
use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::server::Server;
use crate::transport::MessageReader;
use crate::types::{Connection, OutboundWriter};

pub(crate) struct ConnectionHandler<R> {
    connection: Connection,
    reader: MessageReader<R>,
    server: Arc<Server>,
    // Write half that could not be registered; kept open until teardown.
    detached: Option<OutboundWriter>,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(
        connection: Connection,
        reader: MessageReader<R>,
        server: Arc<Server>,
        detached: Option<OutboundWriter>,
    ) -> Self {
        Self {
            connection,
            reader,
            server,
            detached,
        }
    }

    pub(crate) async fn run(mut self) {
        let peer = self.connection.peer;

        match self.forward_messages().await {
            Ok(()) => self
                .server
                .logger()
                .warn(&format!("Disconnecting from {peer}")),
            Err(err) => self
                .server
                .logger()
                .warn(&format!("Connection lost {peer}: {err}")),
        }

        self.server.remove(self.connection.id).await;
        drop(self.detached.take());
    }

    /// Returns `Ok(())` on clean end-of-stream.
    async fn forward_messages(&mut self) -> io::Result<()> {
        let peer = self.connection.peer;

        while let Some(message) = self.reader.read_message().await? {
            self.server.logger().info(&format!("Reading from {peer}"));
            self.server.send_all(&message).await;
        }

        Ok(())
    }
}
