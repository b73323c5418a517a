//! Error types for SimpleChat
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ChatError
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type for SimpleChat operations
#[derive(Debug, Error)]
pub enum ChatError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection State Errors
    // -------------------------------------------------------------------------
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Already listening")]
    AlreadyListening,

    #[error("Connection {0} not found")]
    ConnectionNotFound(u64),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    /// Command issued in a state that forbids it
    #[error("Command rejected: {0}")]
    Command(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Ways a client can break the login gate
///
/// The display text is what the offending client receives (after the
/// `ERROR: ` prefix) right before the relay closes its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("You are already logged in. Connection terminated")]
    DuplicateLogin,

    #[error("Login ID not provided. Connection terminated")]
    MissingIdentity,

    #[error("You must login before sending messages. Connection terminated")]
    NotLoggedIn,
}
