//! System clipboard backed by arboard.

use marker_edit_core::ClipboardSink;
use std::fmt;
use std::io;

/// Writes copied text to the operating system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

impl SystemClipboard {
    /// Connects to the system clipboard.
    pub fn new() -> io::Result<Self> {
        let inner = arboard::Clipboard::new().map_err(to_io_error)?;
        log::debug!("Connected to system clipboard");
        Ok(Self { inner })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()> {
        self.inner.set_text(text).map_err(to_io_error)
    }
}

fn to_io_error(e: arboard::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
