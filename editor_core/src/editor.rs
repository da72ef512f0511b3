//! In-memory editing surface wired to the marker engine.

use crate::buffer::TextBuffer;
use crate::config::MarkerConfig;
use crate::cursor::{Position, Selection};
use crate::engine::MarkerTransformEngine;
use crate::host::{ClipboardSink, TextHost};
use crate::markers::NEWLINE_MARKER;
use std::io;
use std::rc::Rc;

/// A plain text editing surface with whitespace markers.
///
/// Behaves like a native text widget: every change to the buffer or caret,
/// whether from an edit method or from the engine, synchronously fires the
/// matching notification into the engine.
#[derive(Debug)]
pub struct MarkedEditor {
    /// The text buffer.
    buffer: TextBuffer,
    /// Caret and selection.
    selection: Selection,
    /// Marker engine, shared so notifications can re-enter it.
    engine: Rc<MarkerTransformEngine>,
    /// Text-changed notifications fired so far.
    text_notifications: usize,
    /// Caret-changed notifications fired so far.
    caret_notifications: usize,
}

impl Default for MarkedEditor {
    fn default() -> Self {
        Self::new(MarkerConfig::default())
    }
}

impl MarkedEditor {
    /// Creates an empty editor.
    pub fn new(config: MarkerConfig) -> Self {
        Self::with_text("", 0, config)
    }

    /// Creates an editor over raw `text` with the caret at `caret`.
    pub fn with_text(text: &str, caret: usize, config: MarkerConfig) -> Self {
        let buffer = TextBuffer::from_str(text);
        let mut selection = Selection::new(caret);
        selection.clamp(buffer.len_chars());

        let mut editor = Self {
            buffer,
            selection,
            engine: Rc::new(MarkerTransformEngine::new(config)),
            text_notifications: 0,
            caret_notifications: 0,
        };
        let engine = Rc::clone(&editor.engine);
        engine.attach(&mut editor);
        editor
    }

    /// Returns a reference to the buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Returns the marker engine.
    pub fn engine(&self) -> &MarkerTransformEngine {
        &self.engine
    }

    /// Returns the buffer content as displayed, markers included.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Returns the buffer content with markers stripped.
    pub fn plain_text(&self) -> String {
        self.engine.clean_text(&self.buffer.to_string())
    }

    /// Returns the caret character index.
    pub fn cursor_char_index(&self) -> usize {
        self.selection.cursor
    }

    /// Returns the caret position as (line, column).
    pub fn cursor_position(&self) -> Position {
        let (line, col) = self.buffer.char_to_line_col(self.selection.cursor);
        Position::new(line, col)
    }

    /// Returns the number of text-changed notifications fired.
    pub fn text_notifications(&self) -> usize {
        self.text_notifications
    }

    /// Returns the number of caret-changed notifications fired.
    pub fn caret_notifications(&self) -> usize {
        self.caret_notifications
    }

    /// Returns whether markers are shown.
    pub fn markers_enabled(&self) -> bool {
        self.engine.markers_enabled()
    }

    /// Shows or hides whitespace markers.
    pub fn set_markers_enabled(&mut self, enabled: bool) {
        let engine = Rc::clone(&self.engine);
        engine.set_markers_enabled(enabled, self);
    }

    // ==================== Text Editing ====================

    /// Inserts a character at the caret.
    pub fn insert_char(&mut self, ch: char) {
        let mut tmp = [0u8; 4];
        self.insert_text(ch.encode_utf8(&mut tmp));
    }

    /// Inserts a newline at the caret.
    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Inserts a string at the caret, replacing any selection.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        self.delete_selection_internal();
        let pos = self.selection.cursor;
        self.buffer.insert(pos, text);
        self.selection.set_cursor(pos + text.chars().count(), false);
        self.notify_text_changed();
        self.notify_caret_changed();
    }

    /// Deletes the character before the caret (backspace).
    ///
    /// With markers shown, a line break and the marker in front of it go
    /// together.
    pub fn delete_backward(&mut self) {
        if self.delete_selection_internal() {
            self.notify_text_changed();
            self.notify_caret_changed();
            return;
        }

        let pos = self.selection.cursor;
        if pos == 0 {
            return;
        }
        let mut start = pos - 1;
        if self.markers_enabled()
            && start > 0
            && self.buffer.char_at(start) == Some('\n')
            && self.buffer.char_at(start - 1) == Some(NEWLINE_MARKER)
        {
            start -= 1;
        }

        self.buffer.remove(start, pos);
        self.selection.set_cursor(start, false);
        self.notify_text_changed();
        self.notify_caret_changed();
    }

    /// Deletes the character after the caret (delete key).
    ///
    /// With markers shown, a newline marker and the line break after it go
    /// together.
    pub fn delete_forward(&mut self) {
        if self.delete_selection_internal() {
            self.notify_text_changed();
            self.notify_caret_changed();
            return;
        }

        let pos = self.selection.cursor;
        if pos >= self.buffer.len_chars() {
            return;
        }
        let mut end = pos + 1;
        if self.markers_enabled() && self.at_line_break_marker(pos) {
            end += 1;
        }

        self.buffer.remove(pos, end);
        self.notify_text_changed();
    }

    /// Deletes the current selection.
    /// Returns true if there was a selection to delete.
    ///
    /// With markers shown, a selection starting between a newline marker and
    /// its line break also takes the marker.
    fn delete_selection_internal(&mut self) -> bool {
        if let Some((mut start, end)) = self.selection.selected_range() {
            if self.markers_enabled() && start > 0 && self.at_line_break_marker(start - 1) {
                start -= 1;
            }
            self.buffer.remove(start, end);
            self.selection.set_cursor(start, false);
            true
        } else {
            false
        }
    }

    fn at_line_break_marker(&self, pos: usize) -> bool {
        self.buffer.char_at(pos) == Some(NEWLINE_MARKER)
            && self.buffer.char_at(pos + 1) == Some('\n')
    }

    // ==================== Caret Movement ====================

    /// Moves the caret, optionally extending the selection.
    pub fn set_cursor(&mut self, pos: usize, extend_selection: bool) {
        self.selection
            .set_cursor(pos.min(self.buffer.len_chars()), extend_selection);
        self.notify_caret_changed();
    }

    /// Moves the caret left.
    pub fn move_left(&mut self, extend_selection: bool) {
        if !extend_selection && self.selection.has_selection() {
            let (start, _) = self.selection.range();
            self.set_cursor(start, false);
        } else {
            let pos = self.selection.cursor.saturating_sub(1);
            self.set_cursor(pos, extend_selection);
        }
    }

    /// Moves the caret right. With markers shown, the caret never stops
    /// right after a newline marker, so a marker and the character after it
    /// (usually its line break) are crossed in one step.
    pub fn move_right(&mut self, extend_selection: bool) {
        if !extend_selection && self.selection.has_selection() {
            let (_, end) = self.selection.range();
            self.set_cursor(end, false);
            return;
        }

        let len = self.buffer.len_chars();
        let mut target = self.selection.cursor + 1;
        if self.markers_enabled() {
            while target < len && self.buffer.char_at(target - 1) == Some(NEWLINE_MARKER) {
                target += 1;
            }
        }
        self.set_cursor(target, extend_selection);
    }

    // ==================== Selection ====================

    /// Selects from `anchor` to `cursor`.
    pub fn select(&mut self, anchor: usize, cursor: usize) {
        let len = self.buffer.len_chars();
        self.selection = Selection::with_range(anchor.min(len), cursor.min(len));
        self.notify_caret_changed();
    }

    /// Selects all text.
    pub fn select_all(&mut self) {
        self.select(0, self.buffer.len_chars());
    }

    /// Returns true if there is an active selection.
    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    /// Returns the selected range if any, as character indices.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.selection.selected_range()
    }

    /// Returns the selected text as displayed, if any.
    pub fn selected_text(&self) -> Option<String> {
        self.selection
            .selected_range()
            .map(|(start, end)| self.buffer.slice(start, end))
    }

    /// Copies the selection into `clipboard`, stripping markers if shown.
    pub fn copy(&self, clipboard: &mut dyn ClipboardSink) -> io::Result<()> {
        match self.selected_text() {
            Some(text) => self.engine.copy_selection(&text, clipboard),
            None => Ok(()),
        }
    }

    // ==================== Notifications ====================

    fn notify_text_changed(&mut self) {
        self.text_notifications += 1;
        let engine = Rc::clone(&self.engine);
        engine.on_text_changed(self);
    }

    fn notify_caret_changed(&mut self) {
        self.caret_notifications += 1;
        let engine = Rc::clone(&self.engine);
        engine.on_caret_changed(self);
    }
}

impl TextHost for MarkedEditor {
    fn text(&self) -> String {
        self.buffer.to_string()
    }

    fn caret(&self) -> usize {
        self.selection.cursor
    }

    /// Replaces the buffer. The selection collapses onto the caret, clamped
    /// to the new length.
    fn set_text(&mut self, text: &str) {
        let caret_before = self.selection.cursor;
        self.buffer = TextBuffer::from_str(text);
        self.selection.clamp(self.buffer.len_chars());
        self.selection.collapse();
        self.notify_text_changed();
        if self.selection.cursor != caret_before {
            self.notify_caret_changed();
        }
    }

    /// Moves the caret. An active selection keeps its anchor.
    fn set_caret(&mut self, caret: usize) {
        let extend = self.selection.has_selection();
        self.set_cursor(caret, extend);
    }

    fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer.char_at(offset)
    }
}
