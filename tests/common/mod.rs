//! Shared test doubles for the collaborator traits

#![allow(dead_code)]

use std::io::BufReader;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use simplechat::network::{ClientTransport, ConnectionId, Relay, ServerControl};
use simplechat::{ChatError, ChatOutput, Result};

// =============================================================================
// Output
// =============================================================================

/// Captures every displayed line
#[derive(Default)]
pub struct RecordingOutput {
    lines: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ChatOutput for RecordingOutput {
    fn display(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

// =============================================================================
// Relay
// =============================================================================

/// Records what the protocol asks the relay to do
#[derive(Default)]
pub struct MockRelay {
    pub sent: Mutex<Vec<(ConnectionId, String)>>,
    pub broadcasts: Mutex<Vec<String>>,
    pub closed: Mutex<Vec<ConnectionId>>,
}

impl MockRelay {
    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().clone()
    }

    pub fn sent_to(&self, id: ConnectionId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn closed(&self) -> Vec<ConnectionId> {
        self.closed.lock().clone()
    }
}

impl Relay for MockRelay {
    fn send(&self, id: ConnectionId, message: &str) -> Result<()> {
        self.sent.lock().push((id, message.to_string()));
        Ok(())
    }

    fn broadcast(&self, message: &str) {
        self.broadcasts.lock().push(message.to_string());
    }

    fn close(&self, id: ConnectionId) -> Result<()> {
        self.closed.lock().push(id);
        Ok(())
    }

    fn client_count(&self) -> usize {
        0
    }
}

// =============================================================================
// Server control
// =============================================================================

/// In-memory stand-in for the relay's listening controls
pub struct MockControl {
    pub port: Mutex<u16>,
    pub listening: Mutex<bool>,
    pub clients: Mutex<usize>,
    pub broadcasts: Mutex<Vec<String>>,
    pub close_calls: Mutex<usize>,
}

impl MockControl {
    pub fn new(port: u16, listening: bool, clients: usize) -> Self {
        Self {
            port: Mutex::new(port),
            listening: Mutex::new(listening),
            clients: Mutex::new(clients),
            broadcasts: Mutex::new(Vec::new()),
            close_calls: Mutex::new(0),
        }
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().clone()
    }
}

impl ServerControl for MockControl {
    fn port(&self) -> u16 {
        *self.port.lock()
    }

    fn set_port(&self, port: u16) {
        *self.port.lock() = port;
    }

    fn is_listening(&self) -> bool {
        *self.listening.lock()
    }

    fn listen(&self) -> Result<()> {
        let mut listening = self.listening.lock();
        if *listening {
            return Err(ChatError::AlreadyListening);
        }
        *listening = true;
        Ok(())
    }

    fn stop_listening(&self) {
        *self.listening.lock() = false;
    }

    fn close(&self) -> Result<()> {
        *self.close_calls.lock() += 1;
        *self.listening.lock() = false;
        *self.clients.lock() = 0;
        Ok(())
    }

    fn client_count(&self) -> usize {
        *self.clients.lock()
    }

    fn broadcast(&self, message: &str) {
        self.broadcasts.lock().push(message.to_string());
    }
}

// =============================================================================
// Client transport
// =============================================================================

/// In-memory client transport
#[derive(Default)]
pub struct MockTransport {
    pub connected: bool,
    pub sent: Vec<String>,
    pub opened: Vec<(String, u16)>,
    pub close_calls: usize,
    pub fail_open: bool,
    pub fail_send: bool,
}

impl ClientTransport for MockTransport {
    fn open(&mut self, host: &str, port: u16) -> Result<()> {
        if self.connected {
            return Err(ChatError::AlreadyConnected);
        }
        if self.fail_open {
            return Err(ChatError::Transport("connection refused".to_string()));
        }
        self.opened.push((host.to_string(), port));
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.connected = false;
        Ok(())
    }

    fn send(&mut self, message: &str) -> Result<()> {
        if !self.connected {
            return Err(ChatError::NotConnected);
        }
        if self.fail_send {
            return Err(ChatError::Transport("broken pipe".to_string()));
        }
        self.sent.push(message.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// =============================================================================
// Raw TCP helpers
// =============================================================================

/// Connect a bare socket client with a read timeout so tests cannot hang
pub fn raw_connect(addr: std::net::SocketAddr) -> (TcpStream, BufReader<TcpStream>) {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let reader = BufReader::new(stream.try_clone().unwrap());
    (stream, reader)
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
