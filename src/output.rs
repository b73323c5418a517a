//! Console output
//!
//! Text shown to the chat user or relay operator. This is user interface,
//! not logging; diagnostics go through `tracing`.

use std::io::Write;

/// Somewhere to show one line of text to a human
pub trait ChatOutput {
    fn display(&self, message: &str);
}

/// Prints each line to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutOutput;

impl ChatOutput for StdoutOutput {
    fn display(&self, message: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message) {
            tracing::debug!("Failed to write to stdout: {}", e);
        }
    }
}
