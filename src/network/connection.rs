//! Connection Handler
//!
//! Handles individual client connections on the relay side.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::{ConnectionHandler, ConnectionId, Relay};
use crate::error::{ChatError, Result};
use crate::protocol::{read_line, write_line};

/// One accepted client connection
///
/// The read half is handed back from `new` and owned by the connection's
/// thread; the write half lives here so any thread can send.
pub struct Connection {
    id: ConnectionId,

    /// TCP stream writer (buffered, serialized across senders)
    writer: Mutex<BufWriter<TcpStream>>,

    /// Handle used only to shut the socket down
    control: TcpStream,

    /// Peer address for logging
    peer_addr: String,

    /// Set by `close`; the read loop stops handing out buffered lines
    closed: AtomicBool,
}

impl Connection {
    /// Wrap an accepted stream
    ///
    /// Sets up buffered I/O and configures the write timeout. There is no
    /// read timeout: idle clients stay connected.
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        write_timeout_ms: u64,
    ) -> Result<(Self, BufReader<TcpStream>)> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;
        let control = stream.try_clone()?;

        let connection = Self {
            id,
            writer: Mutex::new(BufWriter::new(stream)),
            control,
            peer_addr,
            closed: AtomicBool::new(false),
        };

        Ok((connection, BufReader::new(read_stream)))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Send one line to this client
    pub fn send(&self, message: &str) -> Result<()> {
        let mut writer = self.writer.lock();
        write_line(&mut *writer, message)
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Shut the socket down; the reader thread sees EOF and winds down
    ///
    /// Lines already buffered on the read side are dropped, not delivered.
    pub fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        match self.control.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read lines until the peer goes away (blocking until closed)
    ///
    /// Every line is handed to `handler` until the connection is closed.
    /// Returns `Ok(())` when the client disconnects or the connection is
    /// closed locally, `Err` on any other read failure.
    pub fn serve(
        &self,
        reader: &mut BufReader<TcpStream>,
        relay: &dyn Relay,
        handler: &dyn ConnectionHandler,
    ) -> Result<()> {
        tracing::debug!("Connection {} established from {}", self.id, self.peer_addr);

        loop {
            let line = match read_line(reader) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(ChatError::Io(ref e)) if e.kind() == ErrorKind::ConnectionReset => {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(ChatError::Io(ref e)) if e.kind() == ErrorKind::ConnectionAborted => {
                    tracing::debug!("Connection aborted by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            if self.is_closed() {
                tracing::debug!("Dropping input from closed connection {}", self.peer_addr);
                return Ok(());
            }

            tracing::trace!("Received line from {}: {:?}", self.peer_addr, line);

            handler.on_message(relay, self.id, &line);
        }
    }
}
