//! Whitespace marker glyphs and the raw <-> marked text transforms.
//!
//! Marked text shows every space as [`SPACE_MARKER`] and terminates every
//! line except the last with [`NEWLINE_MARKER`] right before the real line
//! break. The caret is carried across a transform as a (line, column) pair,
//! which both directions leave unchanged.

use crate::buffer::TextBuffer;
use crate::cursor::Position;

/// Glyph shown in place of a space (U+00B7 MIDDLE DOT).
pub const SPACE_MARKER: char = '\u{00B7}';

/// Glyph shown at the end of every non-final line (U+00B6 PILCROW SIGN).
pub const NEWLINE_MARKER: char = '\u{00B6}';

/// Result of a transform pass: the rewritten text and the remapped caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub caret: usize,
}

/// Converts raw text to marked text.
///
/// Idempotent: a line already ending in the newline marker does not get a
/// second one, and existing space markers are not spaces so they stay put.
pub fn insert_markers(text: &str) -> String {
    let mut marked = String::with_capacity(text.len() + text.len() / 4);
    let mut lines = text.split('\n').peekable();

    while let Some(line) = lines.next() {
        marked.extend(line.chars().map(|ch| if ch == ' ' { SPACE_MARKER } else { ch }));

        if lines.peek().is_some() {
            if !line.ends_with(NEWLINE_MARKER) {
                marked.push(NEWLINE_MARKER);
            }
            marked.push('\n');
        }
    }

    marked
}

/// Converts marked text back to raw text.
pub fn remove_markers(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            SPACE_MARKER => Some(' '),
            NEWLINE_MARKER => None,
            other => Some(other),
        })
        .collect()
}

/// Returns the clipboard payload for a marked selection.
pub fn sanitize_for_copy(selected: &str) -> String {
    remove_markers(selected)
}

/// Returns the caret's (line, column), clamping an out-of-range caret to
/// the end of the buffer.
pub fn caret_line_col(buffer: &TextBuffer, caret: usize) -> Position {
    let (line, col) = buffer.char_to_line_col(caret);
    Position::new(line, col)
}

/// Returns the offset of `pos` in `buffer`, clamped to the line and buffer.
pub fn place_caret(buffer: &TextBuffer, pos: Position) -> usize {
    buffer.line_col_to_char(pos.line, pos.col)
}

/// Returns `caret` moved one position back if it sits right after a
/// newline marker.
pub fn pulled_back_caret(buffer: &TextBuffer, caret: usize) -> usize {
    let caret = caret.min(buffer.len_chars());
    if caret > 0 && buffer.char_at(caret - 1) == Some(NEWLINE_MARKER) {
        caret - 1
    } else {
        caret
    }
}

/// Marks `text` and carries `caret` to the same line and column.
///
/// The resulting caret never rests right after a newline marker.
pub fn apply_insert(text: &str, caret: usize) -> Rewrite {
    let pos = caret_line_col(&TextBuffer::from_str(text), caret);
    let marked = insert_markers(text);
    let buffer = TextBuffer::from_str(&marked);
    let caret = pulled_back_caret(&buffer, place_caret(&buffer, pos));
    Rewrite {
        text: marked,
        caret,
    }
}

/// Strips markers from `text` and carries `caret` to the same line and column.
pub fn apply_remove(text: &str, caret: usize) -> Rewrite {
    let pos = caret_line_col(&TextBuffer::from_str(text), caret);
    let raw = remove_markers(text);
    let caret = place_caret(&TextBuffer::from_str(&raw), pos);
    Rewrite { text: raw, caret }
}
