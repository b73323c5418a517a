//! Server operator console
//!
//! Reads one line at a time from the operator. `#` lines drive the relay's
//! listening state; anything else is broadcast to every client.

use std::io::BufRead;

use crate::config::parse_port;
use crate::error::{ChatError, Result};
use crate::network::ServerControl;
use crate::output::ChatOutput;
use crate::protocol::{error_notice, operator_broadcast, Input, ServerCommand};

/// What the console loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Quit,
}

/// Operator console bound to one relay
pub struct ServerConsole<'a, S: ServerControl + ?Sized, O: ChatOutput + ?Sized> {
    server: &'a S,
    output: &'a O,
}

impl<'a, S: ServerControl + ?Sized, O: ChatOutput + ?Sized> ServerConsole<'a, S, O> {
    pub fn new(server: &'a S, output: &'a O) -> Self {
        Self { server, output }
    }

    /// Run until `#quit` or the end of input
    ///
    /// End of input behaves like `#quit` so the relay never outlives its
    /// operator.
    pub fn run<R: BufRead>(&self, input: R) -> Result<()> {
        for line in input.lines() {
            if self.handle_line(&line?) == ConsoleFlow::Quit {
                return Ok(());
            }
        }

        tracing::info!("Console input closed, shutting down");
        self.execute(ServerCommand::Quit);
        Ok(())
    }

    /// Handle one line of operator input
    pub fn handle_line(&self, line: &str) -> ConsoleFlow {
        match Input::classify(line) {
            Input::Command(command) => self.execute(command.into()),
            Input::Text(text) => {
                let message = operator_broadcast(text);
                self.output.display(&message);
                self.server.broadcast(&message);
                ConsoleFlow::Continue
            }
        }
    }

    /// Execute one server command
    pub fn execute(&self, command: ServerCommand) -> ConsoleFlow {
        tracing::debug!("Operator command: {:?}", command);

        let outcome = match command {
            ServerCommand::Quit => {
                self.output.display("Server shutting down...");
                self.server
                    .broadcast(&operator_broadcast("Server is shutting down"));
                if let Err(e) = self.server.close() {
                    self.report(&e);
                }
                return ConsoleFlow::Quit;
            }
            ServerCommand::Stop => self.stop(),
            ServerCommand::Close => self.close(),
            ServerCommand::SetPort(arg) => self.set_port(arg.as_deref()),
            ServerCommand::Start => self.start(),
            ServerCommand::GetPort => Ok(format!("Current port: {}", self.server.port())),
            ServerCommand::Unknown(name) => Err(ChatError::Command(format!(
                "Unknown server command: #{}",
                name
            ))),
        };

        match outcome {
            Ok(message) => self.output.display(&message),
            Err(e) => self.report(&e),
        }
        ConsoleFlow::Continue
    }

    fn stop(&self) -> Result<String> {
        if !self.server.is_listening() {
            return Err(ChatError::Command("Server is already stopped".to_string()));
        }
        self.server.stop_listening();
        Ok("Server stopped listening for new clients".to_string())
    }

    fn close(&self) -> Result<String> {
        if !self.server.is_listening() && self.server.client_count() == 0 {
            return Err(ChatError::Command(
                "Server is already closed/stopped & has no clients".to_string(),
            ));
        }
        self.server
            .broadcast(&operator_broadcast("Server is closing connections"));
        self.server.close()?;
        Ok("Server stopped listening & disconnected all clients".to_string())
    }

    fn set_port(&self, arg: Option<&str>) -> Result<String> {
        if self.server.is_listening() || self.server.client_count() > 0 {
            return Err(ChatError::Command(
                "Cannot set port while running or connected. Please #close first".to_string(),
            ));
        }
        let port = arg.and_then(parse_port).ok_or_else(|| {
            ChatError::InvalidArgument("Invalid port number provided".to_string())
        })?;
        self.server.set_port(port);
        Ok(format!("Port set to {}", self.server.port()))
    }

    fn start(&self) -> Result<String> {
        if self.server.is_listening() {
            return Err(ChatError::Command("Server is already listening".to_string()));
        }
        self.server.listen()?;
        Ok(format!(
            "Server started listening for new clients on port {}",
            self.server.port()
        ))
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
