//! Copy text to the system clipboard through the terminal (OSC 52).
//!
//! Works over SSH and inside tmux (with `set-clipboard on`) because the
//! terminal emulator, not this process, owns the clipboard.

use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Write an OSC 52 "set clipboard" sequence carrying `text` to `out`.
pub fn copy(out: &mut impl Write, text: &str) -> io::Result<()> {
    let payload = STANDARD.encode(text.as_bytes());
    write!(out, "\x1b]52;c;{payload}\x07")?;
    out.flush()
}
