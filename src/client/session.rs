//! Client protocol session
//!
//! Logs in as soon as a connection opens, routes user lines to either the
//! command table or the relay, and shows whatever the relay sends back.

use crate::config::{parse_port, ClientConfig};
use crate::error::{ChatError, Result};
use crate::network::{ClientEvent, ClientTransport};
use crate::output::ChatOutput;
use crate::protocol::{error_notice, login_request, ClientCommand, Input};

/// Why the client is exiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// User asked to quit
    Quit,

    /// Transport failed; the protocol has no way to recover
    Fatal,
}

impl ExitReason {
    /// Process exit code for this reason
    pub fn code(self) -> i32 {
        match self {
            ExitReason::Quit => 0,
            ExitReason::Fatal => 1,
        }
    }
}

/// What the run loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitReason),
}

/// Chat client bound to one transport
///
/// Single-threaded: user input and transport events are fed in one at a
/// time by the run loop.
pub struct ChatClient<T: ClientTransport, O: ChatOutput> {
    config: ClientConfig,
    transport: T,
    output: O,
}

impl<T: ClientTransport, O: ChatOutput> ChatClient<T, O> {
    /// Create a client. Does not connect.
    pub fn new(config: ClientConfig, transport: T, output: O) -> Result<Self> {
        if config.login_id.trim().is_empty() {
            return Err(ChatError::Config("No login ID specified".to_string()));
        }
        Ok(Self {
            config,
            transport,
            output,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the initial connection and log in
    pub fn connect(&mut self) -> Flow {
        if let Err(e) = self.transport.open(&self.config.host, self.config.port) {
            tracing::error!(
                "Could not connect to {}:{}: {}",
                self.config.host,
                self.config.port,
                e
            );
            return self.terminate("ERROR - Can't setup connection! Terminating client.");
        }
        self.connection_established()
    }

    /// Send the login line; nothing else may precede it
    pub fn connection_established(&mut self) -> Flow {
        let login = login_request(&self.config.login_id);
        match self.transport.send(&login) {
            Ok(()) => {
                tracing::debug!("Sent login for {}", self.config.login_id);
                Flow::Continue
            }
            Err(e) => {
                tracing::error!("Login send failed: {}", e);
                self.terminate("ERROR: Could not send login command. Disconnecting...")
            }
        }
    }

    /// Handle one line typed by the user
    pub fn handle_user_input(&mut self, line: &str) -> Flow {
        match Input::classify(line) {
            Input::Command(command) => self.execute(command.into()),
            Input::Text(text) => match self.transport.send(text) {
                Ok(()) => Flow::Continue,
                Err(e) => {
                    tracing::error!("Chat send failed: {}", e);
                    self.terminate("Could not send message to server. Terminating client.")
                }
            },
        }
    }

    /// Handle one event from the transport
    pub fn handle_event(&mut self, event: ClientEvent) -> Flow {
        match event {
            ClientEvent::Message(message) => {
                self.output.display(&message);
                Flow::Continue
            }
            ClientEvent::Closed => {
                self.output.display("Connection closed.");
                Flow::Continue
            }
            ClientEvent::Exception(reason) => {
                tracing::warn!("Connection exception: {}", reason);
                self.terminate("Connection to server lost. Terminating client.")
            }
        }
    }

    /// Execute one client command
    pub fn execute(&mut self, command: ClientCommand) -> Flow {
        tracing::debug!("Client command: {:?}", command);

        let outcome = match command {
            ClientCommand::Quit => {
                self.output.display("Client terminating...");
                return self.quit();
            }
            ClientCommand::Logoff => self.logoff(),
            ClientCommand::SetHost(arg) => self.set_host(arg),
            ClientCommand::SetPort(arg) => self.set_port(arg.as_deref()),
            ClientCommand::Login => return self.login(),
            ClientCommand::GetHost => Ok(format!("Current host: {}", self.config.host)),
            ClientCommand::GetPort => Ok(format!("Current port: {}", self.config.port)),
            ClientCommand::Unknown(name) => {
                Err(ChatError::Command(format!("Unknown command: #{}", name)))
            }
        };

        match outcome {
            Ok(message) => self.output.display(&message),
            Err(e) => self.report(&e),
        }
        Flow::Continue
    }

    /// Close the connection and exit normally
    pub fn quit(&mut self) -> Flow {
        self.close_quietly();
        Flow::Exit(ExitReason::Quit)
    }

    fn logoff(&mut self) -> Result<String> {
        if !self.transport.is_connected() {
            return Err(ChatError::Command(
                "You are not connected to any server".to_string(),
            ));
        }
        self.transport.close()?;
        Ok("Logged off from server".to_string())
    }

    fn set_host(&mut self, arg: Option<String>) -> Result<String> {
        if self.transport.is_connected() {
            return Err(ChatError::Command(
                "Cannot set host while connected to a server. Please #logoff first".to_string(),
            ));
        }
        let host = arg.ok_or_else(|| ChatError::InvalidArgument("No host provided".to_string()))?;
        self.config.host = host;
        Ok(format!("Set host to {}", self.config.host))
    }

    fn set_port(&mut self, arg: Option<&str>) -> Result<String> {
        if self.transport.is_connected() {
            return Err(ChatError::Command(
                "Cannot set port while connected to a server. Please #logoff first".to_string(),
            ));
        }
        let port = arg.and_then(parse_port).ok_or_else(|| {
            ChatError::InvalidArgument(format!("Invalid port number: {}", arg.unwrap_or("")))
        })?;
        self.config.port = port;
        Ok(format!("Set port to {}", self.config.port))
    }

    fn login(&mut self) -> Flow {
        if self.transport.is_connected() {
            self.report(&ChatError::Command(
                "You are already connected to a server".to_string(),
            ));
            return Flow::Continue;
        }

        if let Err(e) = self.transport.open(&self.config.host, self.config.port) {
            self.report(&e);
            return Flow::Continue;
        }

        let flow = self.connection_established();
        if flow == Flow::Continue {
            self.output.display(&format!(
                "Reconnecting to {} on port {}",
                self.config.host, self.config.port
            ));
        }
        flow
    }

    fn terminate(&mut self, message: &str) -> Flow {
        self.output.display(message);
        self.close_quietly();
        Flow::Exit(ExitReason::Fatal)
    }

    fn close_quietly(&mut self) {
        if let Err(e) = self.transport.close() {
            tracing::debug!("Error closing connection: {}", e);
        }
    }

    fn report(&self, error: &ChatError) {
        match error {
            ChatError::Command(reason) | ChatError::InvalidArgument(reason) => {
                self.output.display(&error_notice(reason))
            }
            other => self
                .output
                .display(&format!("Error executing command: {}", other)),
        }
    }
}
