//! # SimpleChat
//!
//! A minimal line-oriented chat relay with:
//! - A login gate: nothing is relayed for a connection until it sends
//!   `#login <identity>`
//! - Broadcast of every relayed line to all connected clients
//! - `#`-commands for the chat user and for the relay operator
//! - Blocking TCP transport, one thread per connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐                     ┌──────────────────────────┐
//! │   ChatClient     │                     │     ServerConsole        │
//! │ (#login, #quit,  │                     │ (#start, #stop, #close,  │
//! │  chat lines)     │                     │  operator broadcasts)    │
//! └────────┬─────────┘                     └────────────┬─────────────┘
//!          │ ClientTransport                            │ ServerControl
//! ┌────────▼─────────┐    newline-delimited  ┌──────────▼─────────────┐
//! │    TcpClient     │ ◄──────────────────►  │       TcpServer        │
//! │ (reader thread)  │        text           │ (acceptor + per-conn   │
//! └──────────────────┘                       │  reader threads)       │
//!                                            └──────────┬─────────────┘
//!                                                       │ ConnectionHandler
//!                                            ┌──────────▼─────────────┐
//!                                            │      ChatServer        │
//!                                            │ (per-connection login  │
//!                                            │  gate, broadcast)      │
//!                                            └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod output;

pub mod protocol;
pub mod network;
pub mod server;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChatError, ProtocolViolation, Result};
pub use config::{ClientConfig, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use output::{ChatOutput, StdoutOutput};
pub use server::{ChatServer, ConsoleFlow, ServerConsole};
pub use client::{ChatClient, ExitReason, Flow};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SimpleChat
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
