//! Capabilities a text-editing surface provides to the marker engine.

use std::io;

/// The editable surface the engine reads and rewrites.
///
/// Offsets are character indices. Implementations may call straight back
/// into the engine from `set_text`/`set_caret` (the way a native text widget
/// re-fires its change events); the engine ignores those calls while its own
/// write is in progress.
pub trait TextHost {
    /// Returns the full buffer content.
    fn text(&self) -> String;

    /// Returns the caret offset.
    fn caret(&self) -> usize;

    /// Replaces the full buffer content.
    fn set_text(&mut self, text: &str);

    /// Moves the caret.
    fn set_caret(&mut self, caret: usize);

    /// Returns the number of characters in the buffer.
    fn len_chars(&self) -> usize {
        self.text().chars().count()
    }

    /// Returns the character at `offset`, if any.
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text().chars().nth(offset)
    }
}

/// Destination for copied text, usually the system clipboard.
pub trait ClipboardSink {
    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()>;
}
