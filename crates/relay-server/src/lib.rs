//! relay-server
//!
//! Multi-client TCP chat relay: every message received from any client
//! is written back out to every connected client, the sender included.
//!
//! - [`server`]    accepts connections and owns the registry
//! - [`registry`]  connection id → outbound writer, with broadcast
//! - [`transport`] framed async reads/writes over `relay-protocol`
//! - [`logger`]    injected diagnostic logging
//! - [`config`]    environment-driven configuration

pub mod config;
pub mod logger;
pub mod registry;
pub mod server;
pub mod transport;
pub mod types;

// internal: one task per connection, spawned by `server`
mod handler;

pub use server::{Server, ServerState};
