//! Protocol codec
//!
//! Line framing for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────────────────┬────┐
//! │      UTF-8 message text      │ \n │
//! └──────────────────────────────┴────┘
//! ```
//! A trailing `\r` before the newline is tolerated and stripped.

use std::io::{BufRead, Read, Write};

use crate::error::{ChatError, Result};

/// Maximum accepted line length (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Read one message from a stream
///
/// Blocks until a full line arrives. Returns `Ok(None)` on a clean EOF.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = Read::take(&mut *reader, MAX_LINE_LEN as u64 + 1).read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }

    if buf.len() > MAX_LINE_LEN && buf.last() != Some(&b'\n') {
        return Err(ChatError::Transport(format!(
            "Line too long: more than {} bytes",
            MAX_LINE_LEN
        )));
    }

    let line = String::from_utf8(buf)
        .map_err(|e| ChatError::Transport(format!("Invalid UTF-8 on the wire: {}", e)))?;

    Ok(Some(line.trim_end_matches(LINE_ENDINGS).to_string()))
}

/// Write one message to a stream and flush it
pub fn write_line<W: Write>(writer: &mut W, message: &str) -> Result<()> {
    writer.write_all(message.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
