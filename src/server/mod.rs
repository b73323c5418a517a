//! Server Module
//!
//! The relay's half of the protocol.
//!
//! ## Responsibilities
//! - `ChatServer`: per-connection login gate and broadcast formatting
//! - `ServerConsole`: operator commands over listening state and
//!   operator broadcasts

mod console;
mod session;

pub use console::{ConsoleFlow, ServerConsole};
pub use session::ChatServer;
