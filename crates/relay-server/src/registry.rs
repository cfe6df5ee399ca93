//! Registry of connected clients and their outbound writers.
//!
//! - Key: `ConnectionId`
//! - Value: the connection's write half (behind its own async mutex)
//!
//! `put` and `remove` take the map's write lock only to edit the map.
//! `remove` shuts the writer down after the lock is released; only the
//! caller that took the entry out of the map closes it, so a connection
//! is never closed twice. `broadcast_all` only holds the read lock long
//! enough to snapshot the targets; writes happen afterwards, one target
//! at a time.
//!
//! A failed broadcast write is logged and skipped. It does not remove
//! the target: deregistration is driven by the connection's own reader.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use relay_protocol::Framing;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::logger::SharedLogger;
use crate::transport::write_frame;
use crate::types::{Connection, ConnectionId, OutboundWriter};

#[derive(Clone)]
struct Outbound {
    peer: SocketAddr,
    writer: Arc<Mutex<OutboundWriter>>,
}

pub struct ConnectionRegistry {
    clients: RwLock<HashMap<ConnectionId, Outbound>>,
    framing: Framing,
    logger: SharedLogger,
}

impl ConnectionRegistry {
    pub fn new(framing: Framing, logger: SharedLogger) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            framing,
            logger,
        }
    }

    /// Register the outbound writer of an open connection.
    ///
    /// Registering the same id twice replaces (and drops) the old writer.
    pub async fn put<W>(&self, connection: Connection, writer: W)
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let outbound = Outbound {
            peer: connection.peer,
            writer: Arc::new(Mutex::new(Box::new(writer))),
        };

        let mut guard = self.clients.write().await;
        if guard.insert(connection.id, outbound).is_some() {
            debug!(id = %connection.id, peer = %connection.peer, "replaced outbound writer");
        }
    }

    /// Write `message` to every registered connection.
    ///
    /// Returns how many connections the frame was delivered to.
    pub async fn broadcast_all(&self, message: &str) -> usize {
        let mut frame = Vec::with_capacity(message.len() + 2);
        if let Err(err) = self.framing.encode(message, &mut frame) {
            self.logger
                .warn(&format!("Message could not be framed for broadcast: {err}"));
            return 0;
        }

        // Snapshot of current clients to minimize lock hold time.
        let targets: Vec<Outbound> = {
            let guard = self.clients.read().await;
            guard.values().cloned().collect()
        };

        let mut delivered = 0;
        for target in &targets {
            let mut writer = target.writer.lock().await;
            match write_frame(&mut *writer, &frame).await {
                Ok(()) => delivered += 1,
                Err(err) => self.logger.warn(&format!(
                    "Some internal error occurred while writing to {}: {err}",
                    target.peer
                )),
            }
        }

        debug!(delivered, targets = targets.len(), "broadcast finished");
        delivered
    }

    /// Deregister a connection and close its outbound writer.
    ///
    /// Returns `false` if the id was not registered (nothing is closed).
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let Some(outbound) = self.clients.write().await.remove(&id) else {
            return false;
        };

        // Map lock is released here; a broadcast stalled on this writer
        // only delays this close, not the rest of the registry.
        let mut writer = outbound.writer.lock().await;
        if let Err(err) = writer.shutdown().await {
            self.logger.warn(&format!(
                "Some internal error occurred while closing the socket {}: {err}",
                outbound.peer
            ));
        }

        true
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.clients.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
