//! Network Module
//!
//! The connection collaborator: owns sockets and threads, and hands the
//! protocol layer lifecycle callbacks plus send/broadcast/close primitives.
//!
//! ## Architecture
//! - Single acceptor thread while listening
//! - One reader thread per connection, invoking `ConnectionHandler`
//! - Client side: one reader thread feeding `ClientEvent`s into a channel
//!
//! The protocol layer only sees the traits below, so it can be driven by
//! the TCP implementations here or by in-memory doubles in tests.

mod client;
mod connection;
mod server;

pub use client::TcpClient;
pub use connection::Connection;
pub use server::TcpServer;

use crate::error::{ChatError, Result};

/// Opaque handle for one relay-side connection
pub type ConnectionId = u64;

/// Outbound primitives the relay offers to the protocol layer
pub trait Relay: Send + Sync {
    /// Send one message to a single connection
    fn send(&self, id: ConnectionId, message: &str) -> Result<()>;

    /// Send one message to every open connection, the sender included
    fn broadcast(&self, message: &str);

    /// Close a connection; its disconnect callback still fires
    fn close(&self, id: ConnectionId) -> Result<()>;

    /// Number of open connections
    fn client_count(&self) -> usize;
}

/// Lifecycle callbacks the relay delivers to the protocol layer
///
/// Callbacks for one connection arrive sequentially on that connection's
/// thread; callbacks for different connections run concurrently.
pub trait ConnectionHandler: Send + Sync {
    fn on_connected(&self, relay: &dyn Relay, id: ConnectionId);

    fn on_message(&self, relay: &dyn Relay, id: ConnectionId, message: &str);

    fn on_disconnected(&self, relay: &dyn Relay, id: ConnectionId);

    /// A read failed; `on_disconnected` follows
    fn on_exception(&self, _relay: &dyn Relay, id: ConnectionId, error: &ChatError) {
        tracing::warn!("Connection {} failed: {}", id, error);
    }

    fn on_listening(&self, _port: u16) {}

    fn on_stopped(&self) {}
}

/// Listening-state controls driven by the operator console
pub trait ServerControl {
    /// Configured listen port
    fn port(&self) -> u16;

    /// Change the listen port; takes effect on the next `listen`
    fn set_port(&self, port: u16);

    fn is_listening(&self) -> bool;

    /// Start accepting new connections
    fn listen(&self) -> Result<()>;

    /// Stop accepting; existing connections stay open
    fn stop_listening(&self);

    /// Stop accepting and close every connection
    fn close(&self) -> Result<()>;

    fn client_count(&self) -> usize;

    /// Send one message to every open connection
    fn broadcast(&self, message: &str);
}

/// Outbound connection used by the chat client
pub trait ClientTransport {
    /// Open a connection. Fails with `AlreadyConnected` if one is open.
    fn open(&mut self, host: &str, port: u16) -> Result<()>;

    /// Close the connection, if any
    fn close(&mut self) -> Result<()>;

    /// Send one message. Fails with `NotConnected` if no connection is open.
    fn send(&mut self, message: &str) -> Result<()>;

    fn is_connected(&self) -> bool;
}

/// Events a client transport reports back to the client run loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// One line from the relay
    Message(String),

    /// The connection ended after a local `close`
    Closed,

    /// The connection ended for any other reason
    Exception(String),
}
