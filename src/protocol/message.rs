//! Wire message definitions
//!
//! Inbound classification on the relay side and the fixed text formats
//! the relay sends back out.

use super::LOGIN_KEYWORD;

/// Prefix on every operator broadcast
pub const SERVER_MSG_PREFIX: &str = "SERVER MSG> ";

/// Prefix on every violation notice
pub const ERROR_PREFIX: &str = "ERROR: ";

/// A line received by the relay from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// `#login ...`; holds the trimmed remainder, possibly empty
    Login(&'a str),

    /// Any other line
    Chat(&'a str),
}

impl<'a> Inbound<'a> {
    /// Classify a raw line. Anything starting with `#login` is a login
    /// attempt, mirroring how the relay has always matched it.
    pub fn classify(line: &'a str) -> Self {
        match line.strip_prefix(LOGIN_KEYWORD) {
            Some(rest) => Inbound::Login(rest.trim()),
            None => Inbound::Chat(line),
        }
    }
}

/// Line a client sends right after connecting
pub fn login_request(identity: &str) -> String {
    format!("{} {}", LOGIN_KEYWORD, identity)
}

/// `"<identity> has logged on."`
pub fn join_notice(identity: &str) -> String {
    format!("{} has logged on.", identity)
}

/// `"<identity>> <message>"`
pub fn chat_relay(identity: &str, message: &str) -> String {
    format!("{}> {}", identity, message)
}

/// `"SERVER MSG> <message>"`
pub fn operator_broadcast(message: &str) -> String {
    format!("{}{}", SERVER_MSG_PREFIX, message)
}

/// `"ERROR: <reason>"`
pub fn error_notice(reason: &str) -> String {
    format!("{}{}", ERROR_PREFIX, reason)
}
