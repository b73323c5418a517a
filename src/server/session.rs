//! Server protocol session
//!
//! Enforces the login gate: a connection must bind an identity with
//! `#login <id>` before anything it sends is relayed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{ChatError, ProtocolViolation};
use crate::network::{ConnectionHandler, ConnectionId, Relay};
use crate::protocol::{chat_relay, error_notice, join_notice, Inbound};

/// Per-connection protocol state
#[derive(Debug, Default)]
struct Session {
    /// Bound once on login, cleared on disconnect
    identity: Option<String>,

    /// Set on the first violation; nothing after it is processed
    terminated: bool,
}

/// Relay-side chat protocol
///
/// ## Concurrency
/// Each connection's record sits behind its own mutex. Login check-and-bind,
/// the gate check on every message, and the clear on disconnect all hold
/// it, so nobody observes a half-updated identity. The outer map lock is
/// only held long enough to find or insert a record.
#[derive(Default)]
pub struct ChatServer {
    sessions: RwLock<HashMap<ConnectionId, Arc<Mutex<Session>>>>,
}

impl ChatServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity bound to a connection, if it has logged in
    pub fn identity(&self, id: ConnectionId) -> Option<String> {
        let session = self.sessions.read().get(&id).cloned()?;
        let identity = session.lock().identity.clone();
        identity
    }

    /// Number of connections with a session record
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Apply one inbound line to a connection's session
    ///
    /// Returns the violation, if any; the caller decides how to reject.
    pub fn handle_message(
        &self,
        relay: &dyn Relay,
        id: ConnectionId,
        message: &str,
    ) -> Result<(), ProtocolViolation> {
        let session = self.session(id);
        if session.lock().terminated {
            tracing::trace!("Ignoring line from terminated connection {}", id);
            return Ok(());
        }

        match Inbound::classify(message) {
            Inbound::Login(identity) => {
                {
                    let mut session = session.lock();
                    if let Some(existing) = &session.identity {
                        tracing::warn!(
                            "Connection {} ({}) sent #login more than once",
                            id,
                            existing
                        );
                        return Err(ProtocolViolation::DuplicateLogin);
                    }
                    if identity.is_empty() {
                        tracing::warn!("Connection {} did not provide a login ID", id);
                        return Err(ProtocolViolation::MissingIdentity);
                    }
                    session.identity = Some(identity.to_string());
                }

                tracing::info!("{} has logged on.", identity);
                relay.broadcast(&join_notice(identity));
            }
            Inbound::Chat(text) => {
                let identity = session.lock().identity.clone();
                let Some(identity) = identity else {
                    tracing::warn!("Connection {} sent a message before #login", id);
                    return Err(ProtocolViolation::NotLoggedIn);
                };

                tracing::debug!("Message received: {} from {}", text, identity);
                relay.broadcast(&chat_relay(&identity, text));
            }
        }

        Ok(())
    }

    /// Tell the offender what it did wrong, then drop it
    fn reject(&self, relay: &dyn Relay, id: ConnectionId, violation: ProtocolViolation) {
        tracing::warn!("Terminating connection {}: {}", id, violation);

        if let Err(e) = relay.send(id, &error_notice(&violation.to_string())) {
            tracing::debug!("Could not deliver error to connection {}: {}", id, e);
        }
        if let Err(e) = relay.close(id) {
            tracing::debug!("Could not close connection {}: {}", id, e);
        }
    }

    fn session(&self, id: ConnectionId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().get(&id) {
            return Arc::clone(session);
        }
        Arc::clone(self.sessions.write().entry(id).or_default())
    }
}

impl ConnectionHandler for ChatServer {
    fn on_connected(&self, _relay: &dyn Relay, id: ConnectionId) {
        tracing::info!("A new client has connected to the server (connection {})", id);
        self.sessions.write().entry(id).or_default();
    }

    fn on_message(&self, relay: &dyn Relay, id: ConnectionId, message: &str) {
        if let Err(violation) = self.handle_message(relay, id, message) {
            self.session(id).lock().terminated = true;
            self.reject(relay, id, violation);
        }
    }

    fn on_disconnected(&self, _relay: &dyn Relay, id: ConnectionId) {
        let Some(session) = self.sessions.write().remove(&id) else {
            return;
        };

        let identity = session.lock().identity.take();
        match identity {
            Some(identity) => tracing::info!("{} has disconnected.", identity),
            None => tracing::info!("Connection {} disconnected before logging in", id),
        }
    }

    fn on_exception(&self, _relay: &dyn Relay, id: ConnectionId, error: &ChatError) {
        tracing::warn!("Connection {} failed: {}", id, error);
    }

    fn on_listening(&self, port: u16) {
        tracing::info!("Server listening for connections on port {}", port);
    }

    fn on_stopped(&self) {
        tracing::info!("Server has stopped listening for connections.");
    }
}
