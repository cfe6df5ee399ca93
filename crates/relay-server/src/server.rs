//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Binds the listening socket.
//! - Accepts new TCP connections.
//! - Assigns each connection a `ConnectionId`.
//! - Registers the connection's write half in the `ConnectionRegistry`.
//! - Spawns one `ConnectionHandler` task per connection for reading.
//!
//! Lifecycle: `Stopped → Listening → ShuttingDown → Stopped`. A bind
//! failure skips `Listening`. There is no orchestrated shutdown; the
//! accept loop only ends when `accept` itself fails.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_protocol::Framing;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::handler::ConnectionHandler;
use crate::logger::SharedLogger;
use crate::registry::ConnectionRegistry;
use crate::transport::MessageReader;
use crate::types::{Connection, ConnectionId, OutboundWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Listening,
    ShuttingDown,
}

pub struct Server {
    registry: ConnectionRegistry,
    framing: Framing,
    logger: SharedLogger,
    state: watch::Sender<ServerState>,
    next_id: AtomicU64,
}

impl Server {
    pub fn new(framing: Framing, logger: SharedLogger) -> Arc<Self> {
        let (state, _) = watch::channel(ServerState::Stopped);

        Arc::new(Self {
            registry: ConnectionRegistry::new(framing, Arc::clone(&logger)),
            framing,
            logger,
            state,
            next_id: AtomicU64::new(1),
        })
    }

    /// Bind `addr` and serve until the accept loop fails.
    ///
    /// A bind failure is logged as fatal and the server goes straight to
    /// shutdown without accepting anything. No retry.
    pub async fn start(self: &Arc<Self>, addr: &str) {
        match self.bind(addr).await {
            Ok(listener) => self.serve(listener).await,
            Err(err) => {
                self.logger
                    .fatal(&format!("Server could not be started on {addr}: {err}"));
                self.shut_down(None);
            }
        }
    }

    pub async fn bind(&self, addr: &str) -> io::Result<TcpListener> {
        TcpListener::bind(addr).await
    }

    /// Run the accept loop on an already bound listener.
    pub async fn serve(self: &Arc<Self>, listener: TcpListener) {
        match listener.local_addr() {
            Ok(local) => self.logger.info(&format!(
                "Server started! Listening on port {}",
                local.port()
            )),
            Err(_) => self.logger.info("Server started!"),
        }
        self.state.send_replace(ServerState::Listening);

        let err = loop {
            match listener.accept().await {
                Ok((stream, peer)) => self.accept_connection(stream, peer).await,
                Err(err) => break err,
            }
        };

        self.logger.fatal(&format!("Accept loop failed: {err}"));
        self.shut_down(Some(listener));
    }

    async fn accept_connection(self: &Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        self.logger
            .info(&format!("Accepted a connection from {peer}"));

        let connection = Connection {
            id: self.next_connection_id(),
            peer,
        };

        // Outbound writes are one small frame each; don't let Nagle hold them back.
        let prepared = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let detached: Option<OutboundWriter> = match prepared {
            Ok(()) => {
                self.registry.put(connection, write_half).await;
                None
            }
            Err(err) => {
                self.logger
                    .warn(&format!("Outbound stream could not be stored for {peer}: {err}"));
                Some(Box::new(write_half))
            }
        };

        let handler = ConnectionHandler::new(
            connection,
            MessageReader::new(read_half, self.framing),
            Arc::clone(self),
            detached,
        );
        tokio::spawn(handler.run());
    }

    fn shut_down(&self, listener: Option<TcpListener>) {
        self.state.send_replace(ServerState::ShuttingDown);
        self.logger.info("Shutting the server down...");
        drop(listener);
        self.state.send_replace(ServerState::Stopped);
    }

    fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Broadcast `message` to every registered connection.
    pub async fn send_all(&self, message: &str) -> usize {
        self.registry.broadcast_all(message).await
    }

    /// Deregister and close a connection.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        self.registry.remove(id).await
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }
}
