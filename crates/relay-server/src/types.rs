//! Shared types for the relay server.
//!
//! This module defines:
//! - `ConnectionId`: a lightweight handle for connected clients
//! - `Connection`: the handle plus the peer address used in logs
//! - the type-erased outbound writer stored in the registry

use std::fmt;
use std::net::SocketAddr;

use tokio::io::AsyncWrite;

/// Identifier for a connected client.
///
/// Opaque; unique over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accepted client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer: SocketAddr,
}

/// Write half of a connection, as stored in the registry.
pub type OutboundWriter = Box<dyn AsyncWrite + Send + Unpin>;
