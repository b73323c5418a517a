//! Command definitions
//!
//! Parses `#`-prefixed console lines and maps them onto the client and
//! server command tables.

use super::COMMAND_PREFIX;

/// One line of console input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    /// Line began with the command prefix
    Command(Command),

    /// Anything else: a chat payload or operator broadcast
    Text(&'a str),
}

impl<'a> Input<'a> {
    /// Classify a raw line typed by a user or operator
    pub fn classify(line: &'a str) -> Self {
        match line.strip_prefix(COMMAND_PREFIX) {
            Some(rest) => Input::Command(Command::parse(rest)),
            None => Input::Text(line),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lower-cased command name
    pub name: String,

    /// Trimmed remainder after the name, if any
    pub argument: Option<String>,
}

impl Command {
    /// Parse a command line that has already lost its `#` prefix
    ///
    /// Splits on the first run of whitespace. `"SetPort   6000 "` becomes
    /// `{ name: "setport", argument: Some("6000") }`.
    pub fn parse(body: &str) -> Self {
        let body = body.trim();
        let (name, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };

        let rest = rest.trim();
        Self {
            name: name.to_lowercase(),
            argument: (!rest.is_empty()).then(|| rest.to_string()),
        }
    }
}

/// Commands understood by the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Quit,
    Logoff,
    SetHost(Option<String>),
    SetPort(Option<String>),
    Login,
    GetHost,
    GetPort,
    Unknown(String),
}

impl From<Command> for ClientCommand {
    fn from(command: Command) -> Self {
        match command.name.as_str() {
            "quit" => ClientCommand::Quit,
            "logoff" => ClientCommand::Logoff,
            "sethost" => ClientCommand::SetHost(command.argument),
            "setport" => ClientCommand::SetPort(command.argument),
            "login" => ClientCommand::Login,
            "gethost" => ClientCommand::GetHost,
            "getport" => ClientCommand::GetPort,
            _ => ClientCommand::Unknown(command.name),
        }
    }
}

/// Commands understood by the server operator console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    Quit,
    Stop,
    Close,
    SetPort(Option<String>),
    Start,
    GetPort,
    Unknown(String),
}

impl From<Command> for ServerCommand {
    fn from(command: Command) -> Self {
        match command.name.as_str() {
            "quit" => ServerCommand::Quit,
            "stop" => ServerCommand::Stop,
            "close" => ServerCommand::Close,
            "setport" => ServerCommand::SetPort(command.argument),
            "start" => ServerCommand::Start,
            "getport" => ServerCommand::GetPort,
            _ => ServerCommand::Unknown(command.name),
        }
    }
}
