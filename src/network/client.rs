//! TCP Client
//!
//! Outbound connection for the chat client. Inbound lines are read on a
//! background thread and forwarded as `ClientEvent`s.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};

use super::{ClientEvent, ClientTransport};
use crate::error::{ChatError, Result};
use crate::protocol::{read_line, write_line};

/// Connection is up and usable
const OPEN: u8 = 0;
/// Local close requested; the reader will report `Closed`
const CLOSING: u8 = 1;
/// Reader has finished
const ENDED: u8 = 2;

/// Blocking TCP implementation of `ClientTransport`
pub struct TcpClient {
    events: Sender<ClientEvent>,
    active: Option<ActiveConnection>,
}

struct ActiveConnection {
    writer: BufWriter<TcpStream>,

    /// Handle used only to shut the socket down
    control: TcpStream,

    /// `OPEN`, `CLOSING` or `ENDED`; whoever leaves `OPEN` first decides
    /// whether the end is reported as `Closed` or `Exception`
    state: Arc<AtomicU8>,

    reader: Option<JoinHandle<()>>,
}

impl ActiveConnection {
    fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }
}

impl TcpClient {
    /// Create a client that reports events on `events`
    pub fn new(events: Sender<ClientEvent>) -> Self {
        Self {
            events,
            active: None,
        }
    }

    /// Create a client together with the receiving end of its event channel
    pub fn channel() -> (Self, Receiver<ClientEvent>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    fn shutdown_active(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        // Fails if the reader already ended; that loss stays an exception
        let _ = active
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire);
        let result = match active.control.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        };

        if let Some(reader) = active.reader.take() {
            if reader.join().is_err() {
                tracing::error!("Client reader thread panicked");
            }
        }

        result
    }
}

impl ClientTransport for TcpClient {
    fn open(&mut self, host: &str, port: u16) -> Result<()> {
        if self.is_connected() {
            return Err(ChatError::AlreadyConnected);
        }
        // Reap a connection the relay already dropped
        self.shutdown_active()?;

        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        tracing::debug!("Connected to {}:{}", host, port);

        let read_stream = stream.try_clone()?;
        let control = stream.try_clone()?;
        let state = Arc::new(AtomicU8::new(OPEN));

        let reader = {
            let events = self.events.clone();
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name("client-reader".to_string())
                .spawn(move || read_loop(BufReader::new(read_stream), events, state))?
        };

        self.active = Some(ActiveConnection {
            writer: BufWriter::new(stream),
            control,
            state,
            reader: Some(reader),
        });

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.shutdown_active()
    }

    fn send(&mut self, message: &str) -> Result<()> {
        match self.active.as_mut() {
            Some(active) if active.is_open() => {
                write_line(&mut active.writer, message)
            }
            _ => Err(ChatError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, ActiveConnection::is_open)
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown_active() {
            tracing::debug!("Error closing client on drop: {}", e);
        }
    }
}

fn read_loop(
    mut reader: BufReader<TcpStream>,
    events: Sender<ClientEvent>,
    state: Arc<AtomicU8>,
) {
    let failure = loop {
        match read_line(&mut reader) {
            Ok(Some(line)) => {
                tracing::trace!("Received line: {:?}", line);
                if events.send(ClientEvent::Message(line)).is_err() {
                    break None;
                }
            }
            Ok(None) => break Some("connection closed by server".to_string()),
            Err(e) => break Some(e.to_string()),
        }
    };

    let event = if state.swap(ENDED, Ordering::AcqRel) == CLOSING {
        ClientEvent::Closed
    } else {
        match failure {
            Some(reason) => {
                tracing::debug!("Connection lost: {}", reason);
                ClientEvent::Exception(reason)
            }
            None => return,
        }
    };

    // Receiver may be gone during shutdown
    let _ = events.send(event);
}
