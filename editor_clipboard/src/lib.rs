//! Marker Edit Clipboard - Clipboard sinks for sanitized copy.

pub mod memory;
pub mod system;

pub use memory::MemoryClipboard;
pub use system::SystemClipboard;
