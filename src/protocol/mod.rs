//! Protocol Module
//!
//! Defines the text protocol shared by the client, the relay and the
//! operator console.
//!
//! ## Protocol Format
//!
//! Newline-delimited UTF-8 text. Two kinds of line:
//! - Control: first character is `#`, parsed as `#<name> [argument]`
//! - Payload: anything else, a chat message
//!
//! ### Client → Relay
//! - `#login <identity>`: must be the first line on a connection
//! - `<text>`: chat payload, relayed only after a successful login
//!
//! ### Relay → Client
//! - `<identity> has logged on.`
//! - `<identity>> <text>`
//! - `SERVER MSG> <text>`
//! - `ERROR: <reason>` (always followed by the relay closing the connection)

mod codec;
mod command;
mod message;

pub use codec::{read_line, write_line, MAX_LINE_LEN};
pub use command::{ClientCommand, Command, Input, ServerCommand};
pub use message::{
    chat_relay, error_notice, join_notice, login_request, operator_broadcast, Inbound,
    ERROR_PREFIX, SERVER_MSG_PREFIX,
};

/// First character of every control line
pub const COMMAND_PREFIX: char = '#';

/// Control keyword a client uses to bind its identity
pub const LOGIN_KEYWORD: &str = "#login";
