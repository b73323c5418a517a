//! TCP Server
//!
//! Accepts connections and gives each one its own reader thread.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::{Connection, ConnectionHandler, ConnectionId, Relay, ServerControl};
use crate::config::ServerConfig;
use crate::error::{ChatError, Result};

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// TCP relay for SimpleChat
///
/// Listening state and the set of open connections are independent:
/// `stop_listening` leaves connections alone, `close` ends both.
pub struct TcpServer {
    shared: Arc<Shared>,
}

/// State shared between the server handle, the acceptor and every
/// connection thread
struct Shared {
    config: Mutex<ServerConfig>,
    handler: Arc<dyn ConnectionHandler>,
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    acceptor: Mutex<Option<Acceptor>>,
    next_id: AtomicU64,
}

/// Running accept loop
struct Acceptor {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl TcpServer {
    /// Create a new server with the given config and protocol handler.
    /// Nothing is bound until `listen`.
    pub fn new(config: ServerConfig, handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: Mutex::new(config),
                handler,
                connections: RwLock::new(HashMap::new()),
                acceptor: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Address actually bound, while listening
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.acceptor.lock().as_ref().map(|a| a.local_addr)
    }
}

impl ServerControl for TcpServer {
    fn port(&self) -> u16 {
        self.shared.config.lock().port
    }

    fn set_port(&self, port: u16) {
        self.shared.config.lock().port = port;
    }

    fn is_listening(&self) -> bool {
        self.shared.acceptor.lock().is_some()
    }

    fn listen(&self) -> Result<()> {
        let mut acceptor = self.shared.acceptor.lock();
        if acceptor.is_some() {
            return Err(ChatError::AlreadyListening);
        }

        let addr = self.shared.config.lock().listen_addr();
        let listener = TcpListener::bind(&addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let shared = Arc::clone(&self.shared);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("acceptor".to_string())
                .spawn(move || accept_loop(shared, listener, stop))?
        };

        *acceptor = Some(Acceptor {
            stop,
            thread: Some(thread),
            local_addr,
        });
        drop(acceptor);

        tracing::info!("Listening on {}", local_addr);
        self.shared.handler.on_listening(local_addr.port());
        Ok(())
    }

    fn stop_listening(&self) {
        let Some(mut acceptor) = self.shared.acceptor.lock().take() else {
            return;
        };

        acceptor.stop.store(true, Ordering::Release);
        if let Some(thread) = acceptor.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Acceptor thread panicked");
            }
        }

        tracing::info!("Stopped listening on {}", acceptor.local_addr);
        self.shared.handler.on_stopped();
    }

    fn close(&self) -> Result<()> {
        self.stop_listening();

        let drained: Vec<Arc<Connection>> = self
            .shared
            .connections
            .write()
            .drain()
            .map(|(_, conn)| conn)
            .collect();

        tracing::info!("Closing {} connection(s)", drained.len());

        let mut first_error = None;
        for conn in drained {
            if let Err(e) = conn.close() {
                tracing::warn!("Failed to close connection {}: {}", conn.id(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn client_count(&self) -> usize {
        self.shared.client_count()
    }

    fn broadcast(&self, message: &str) {
        self.shared.broadcast(message);
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        if let Err(e) = ServerControl::close(self) {
            tracing::debug!("Error closing server on drop: {}", e);
        }
    }
}

impl Relay for Shared {
    fn send(&self, id: ConnectionId, message: &str) -> Result<()> {
        let conn = self
            .connections
            .read()
            .get(&id)
            .cloned()
            .ok_or(ChatError::ConnectionNotFound(id))?;
        conn.send(message)
    }

    fn broadcast(&self, message: &str) {
        let targets: Vec<Arc<Connection>> = self.connections.read().values().cloned().collect();

        for conn in targets {
            // A failed write only affects that one client; its reader
            // thread will notice and clean up.
            if let Err(e) = conn.send(message) {
                tracing::warn!("Broadcast to {} failed: {}", conn.peer_addr(), e);
            }
        }
    }

    fn close(&self, id: ConnectionId) -> Result<()> {
        let conn = self
            .connections
            .write()
            .remove(&id)
            .ok_or(ChatError::ConnectionNotFound(id))?;
        conn.close()
    }

    fn client_count(&self) -> usize {
        self.connections.read().len()
    }
}

fn accept_loop(shared: Arc<Shared>, listener: TcpListener, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = spawn_connection(&shared, stream) {
                    tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

fn spawn_connection(shared: &Arc<Shared>, stream: TcpStream) -> Result<()> {
    // Accepted sockets may inherit non-blocking mode from the listener
    stream.set_nonblocking(false)?;

    let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
    let write_timeout_ms = shared.config.lock().write_timeout_ms;
    let (conn, mut reader) = Connection::new(id, stream, write_timeout_ms)?;
    let conn = Arc::new(conn);

    shared.connections.write().insert(id, Arc::clone(&conn));

    let thread_shared = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name(format!("conn-{}", id))
        .spawn(move || {
            let shared = thread_shared;
            let handler = Arc::clone(&shared.handler);

            handler.on_connected(&*shared, id);

            if let Err(e) = conn.serve(&mut reader, &*shared, &*handler) {
                handler.on_exception(&*shared, id, &e);
            }

            // May already be gone if it was closed locally
            shared.connections.write().remove(&id);
            handler.on_disconnected(&*shared, id);
        });

    if let Err(e) = spawned {
        shared.connections.write().remove(&id);
        return Err(e.into());
    }

    Ok(())
}
