//! Marker Edit Core - Visible whitespace markers for plain text buffers.
//!
//! This crate contains the marker transformation engine and a reference
//! editing surface, without any dependencies on windowing, rendering or
//! the system clipboard.

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod engine;
pub mod host;
pub mod markers;

pub use buffer::TextBuffer;
pub use config::MarkerConfig;
pub use cursor::{Position, Selection};
pub use editor::MarkedEditor;
pub use engine::{EngineStats, MarkerTransformEngine};
pub use host::{ClipboardSink, TextHost};
pub use markers::{sanitize_for_copy, NEWLINE_MARKER, SPACE_MARKER};
