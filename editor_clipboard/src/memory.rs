//! In-process clipboard for headless hosts.

use marker_edit_core::ClipboardSink;
use std::io;

/// Keeps the last copied text in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    writes: usize,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently copied text.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Returns how many times text was copied.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Takes the copied text, leaving the clipboard empty.
    pub fn take(&mut self) -> Option<String> {
        self.contents.take()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()> {
        self.contents = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_edit_core::{MarkedEditor, MarkerConfig};

    #[test]
    fn test_copy_from_marked_editor() {
        let mut editor = MarkedEditor::with_text("ab cd\nef", 0, MarkerConfig::default());
        let mut clipboard = MemoryClipboard::new();

        editor.select_all();
        editor.copy(&mut clipboard).unwrap();

        assert_eq!(clipboard.contents(), Some("ab cd\nef"));
        assert_eq!(clipboard.writes(), 1);
    }

    #[test]
    fn test_copy_from_plain_editor() {
        let mut editor = MarkedEditor::with_text(
            "a\u{00B7}b\u{00B6}",
            0,
            MarkerConfig::default().with_show_markers(false),
        );
        let mut clipboard = MemoryClipboard::new();

        editor.select_all();
        editor.copy(&mut clipboard).unwrap();

        assert_eq!(clipboard.take().as_deref(), Some("a\u{00B7}b\u{00B6}"));
        assert_eq!(clipboard.contents(), None);
    }

    #[test]
    fn test_empty_selection_not_copied() {
        let editor = MarkedEditor::with_text("abc", 1, MarkerConfig::default());
        let mut clipboard = MemoryClipboard::new();

        editor.copy(&mut clipboard).unwrap();

        assert_eq!(clipboard.writes(), 0);
    }
}
