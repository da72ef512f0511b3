//! Marker transformation engine.
//!
//! The engine keeps a host's buffer in marked form while markers are shown,
//! strips them when markers are hidden, and sanitizes copied text. A host
//! forwards its text-changed and caret-changed events here. Any write the
//! engine makes back into the host happens under a mutation guard, and
//! every handler is a no-op while the guard is held, so notifications the
//! host re-fires for the engine's own writes never recurse.

use crate::config::MarkerConfig;
use crate::host::{ClipboardSink, TextHost};
use crate::markers::{self, Rewrite, NEWLINE_MARKER};
use std::cell::Cell;
use std::io;

/// Counters for the work the engine has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Raw -> marked passes run.
    pub insert_passes: u64,
    /// Marked -> raw passes run.
    pub remove_passes: u64,
    /// Times the caret was moved off a newline marker.
    pub caret_pullbacks: u64,
    /// Notifications ignored because the engine itself was writing.
    pub suppressed_notifications: u64,
}

/// Holds the reentrancy flag for the duration of an engine-initiated write.
///
/// Dropping the guard restores the previous flag value, including when the
/// host panics during the write.
struct MutationGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> MutationGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Keeps whitespace markers in a host buffer in sync with the caret.
///
/// All state lives in `Cell`s so a host holding the engine behind an `Rc`
/// can call back into it while one of its own methods is running.
#[derive(Debug)]
pub struct MarkerTransformEngine {
    enabled: Cell<bool>,
    mutating: Cell<bool>,
    stats: Cell<EngineStats>,
}

impl Default for MarkerTransformEngine {
    fn default() -> Self {
        Self::new(MarkerConfig::default())
    }
}

impl MarkerTransformEngine {
    /// Creates an engine. Nothing is rewritten until [`attach`](Self::attach).
    pub fn new(config: MarkerConfig) -> Self {
        Self {
            enabled: Cell::new(config.show_markers),
            mutating: Cell::new(false),
            stats: Cell::new(EngineStats::default()),
        }
    }

    /// Brings a freshly supplied host buffer into the configured mode.
    pub fn attach(&self, host: &mut dyn TextHost) {
        if self.enabled.get() {
            self.insert_pass(host);
        }
    }

    /// Returns whether markers are currently shown.
    pub fn markers_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Shows or hides markers, rewriting the host buffer on a change.
    pub fn set_markers_enabled(&self, enabled: bool, host: &mut dyn TextHost) {
        if self.enabled.get() == enabled {
            return;
        }
        self.enabled.set(enabled);
        log::info!("Whitespace markers {}", if enabled { "enabled" } else { "disabled" });

        if enabled {
            self.insert_pass(host);
        } else {
            self.remove_pass(host);
        }
    }

    /// Returns true while the engine is writing into its host.
    pub fn is_mutating(&self) -> bool {
        self.mutating.get()
    }

    /// Returns a snapshot of the engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.get()
    }

    /// Handles a change to the host buffer.
    pub fn on_text_changed(&self, host: &mut dyn TextHost) {
        if self.suppressed("text changed") {
            return;
        }
        if self.enabled.get() {
            self.insert_pass(host);
        }
    }

    /// Handles a caret move in the host.
    ///
    /// An out-of-range caret is clamped. While markers are shown, a caret
    /// resting right after a newline marker is moved back in front of it.
    pub fn on_caret_changed(&self, host: &mut dyn TextHost) {
        if self.suppressed("caret changed") {
            return;
        }

        let caret = host.caret();
        let mut target = caret.min(host.len_chars());
        if self.enabled.get() && target > 0 && host.char_at(target - 1) == Some(NEWLINE_MARKER) {
            target -= 1;
            self.update_stats(|stats| stats.caret_pullbacks += 1);
            log::trace!("Pulled caret back from {} to {}", caret, target);
        }

        if target != caret {
            let _guard = MutationGuard::engage(&self.mutating);
            host.set_caret(target);
        }
    }

    /// Returns the clipboard payload for `selected`.
    pub fn on_copy_requested(&self, selected: &str) -> String {
        self.clean_text(selected)
    }

    /// Copies `selected` into `sink`. An empty selection leaves the sink alone.
    pub fn copy_selection(&self, selected: &str, sink: &mut dyn ClipboardSink) -> io::Result<()> {
        if selected.is_empty() {
            return Ok(());
        }
        let payload = self.on_copy_requested(selected);
        if let Err(e) = sink.set_clipboard_text(&payload) {
            log::warn!("Failed to set clipboard text: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Returns `text` as external consumers should see it.
    pub fn clean_text(&self, text: &str) -> String {
        if self.enabled.get() {
            markers::sanitize_for_copy(text)
        } else {
            text.to_string()
        }
    }

    fn insert_pass(&self, host: &mut dyn TextHost) {
        let text = host.text();
        let caret = host.caret();
        let rewrite = markers::apply_insert(&text, caret);
        self.update_stats(|stats| stats.insert_passes += 1);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Insert pass over {} lines, caret {} -> {}",
                rewrite.text.split('\n').count(),
                caret,
                rewrite.caret
            );
        }
        self.write_back(host, &text, caret, rewrite);
    }

    fn remove_pass(&self, host: &mut dyn TextHost) {
        let text = host.text();
        let caret = host.caret();
        let rewrite = markers::apply_remove(&text, caret);
        self.update_stats(|stats| stats.remove_passes += 1);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Remove pass over {} lines, caret {} -> {}",
                rewrite.text.split('\n').count(),
                caret,
                rewrite.caret
            );
        }
        self.write_back(host, &text, caret, rewrite);
    }

    fn write_back(&self, host: &mut dyn TextHost, text: &str, caret: usize, rewrite: Rewrite) {
        let text_changed = rewrite.text != text;
        if !text_changed && rewrite.caret == caret {
            return;
        }

        let _guard = MutationGuard::engage(&self.mutating);
        if text_changed {
            host.set_text(&rewrite.text);
        }
        // Replacing the text may have moved the caret, so always restore it.
        host.set_caret(rewrite.caret);
    }

    fn suppressed(&self, event: &str) -> bool {
        if !self.mutating.get() {
            return false;
        }
        self.update_stats(|stats| stats.suppressed_notifications += 1);
        log::trace!("Ignoring self-triggered {} notification", event);
        true
    }

    fn update_stats(&self, f: impl FnOnce(&mut EngineStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Host that re-fires notifications into the engine on every write,
    /// like a native text widget does.
    #[derive(Default)]
    struct EchoHost {
        text: String,
        caret: usize,
        engine: Option<Rc<MarkerTransformEngine>>,
        writes: usize,
        writes_under_guard: usize,
        panic_on_set_text: bool,
    }

    impl EchoHost {
        fn new(text: &str, caret: usize, engine: &Rc<MarkerTransformEngine>) -> Self {
            Self {
                text: text.to_string(),
                caret,
                engine: Some(Rc::clone(engine)),
                ..Self::default()
            }
        }

        fn record_write(&mut self) {
            self.writes += 1;
            if self.engine.as_ref().is_some_and(|engine| engine.is_mutating()) {
                self.writes_under_guard += 1;
            }
        }
    }

    impl TextHost for EchoHost {
        fn text(&self) -> String {
            self.text.clone()
        }

        fn caret(&self) -> usize {
            self.caret
        }

        fn set_text(&mut self, text: &str) {
            if self.panic_on_set_text {
                panic!("host rejected write");
            }
            self.record_write();
            self.text = text.to_string();
            // Native widgets reset the caret when the whole text is replaced
            self.caret = 0;
            if let Some(engine) = self.engine.clone() {
                engine.on_text_changed(self);
                engine.on_caret_changed(self);
            }
        }

        fn set_caret(&mut self, caret: usize) {
            self.record_write();
            self.caret = caret;
            if let Some(engine) = self.engine.clone() {
                engine.on_caret_changed(self);
            }
        }
    }

    struct VecClipboard(Vec<String>);

    impl ClipboardSink for VecClipboard {
        fn set_clipboard_text(&mut self, text: &str) -> io::Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    impl ClipboardSink for BrokenClipboard {
        fn set_clipboard_text(&mut self, _text: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "clipboard unavailable"))
        }
    }

    #[test]
    fn test_attach_marks_buffer_by_default() {
        init_logging();
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("ab cd\nef", 3, &engine);

        engine.attach(&mut host);

        assert_eq!(host.text, "ab\u{00B7}cd\u{00B6}\nef");
        assert_eq!(host.caret, 3);
        assert!(!engine.is_mutating());
    }

    #[test]
    fn test_attach_disabled_leaves_buffer() {
        let engine = Rc::new(MarkerTransformEngine::new(
            MarkerConfig::default().with_show_markers(false),
        ));
        let mut host = EchoHost::new("a b", 1, &engine);

        engine.attach(&mut host);

        assert_eq!(host.text, "a b");
        assert_eq!(host.writes, 0);
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_toggle_round_trip() {
        init_logging();
        let engine = Rc::new(MarkerTransformEngine::new(
            MarkerConfig::default().with_show_markers(false),
        ));
        let mut host = EchoHost::new(" x y\n\nz ", 6, &engine);

        engine.set_markers_enabled(true, &mut host);
        assert_eq!(host.text, "\u{00B7}x\u{00B7}y\u{00B6}\n\u{00B6}\nz\u{00B7}");
        assert_eq!(host.caret, 8);

        engine.set_markers_enabled(false, &mut host);
        assert_eq!(host.text, " x y\n\nz ");
        assert_eq!(host.caret, 6);
    }

    #[test]
    fn test_toggle_is_idempotent() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("a b", 0, &engine);
        engine.attach(&mut host);
        let writes = host.writes;

        engine.set_markers_enabled(true, &mut host);
        engine.set_markers_enabled(true, &mut host);

        assert_eq!(host.writes, writes);
        assert_eq!(engine.stats().insert_passes, 1);

        engine.set_markers_enabled(false, &mut host);
        engine.set_markers_enabled(false, &mut host);
        assert_eq!(engine.stats().remove_passes, 1);
        assert_eq!(host.text, "a b");
    }

    #[test]
    fn test_text_change_runs_one_pass() {
        init_logging();
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("", 0, &engine);
        engine.attach(&mut host);
        let before = engine.stats();

        // Host-originated edit: user typed "hi there"
        host.text = "hi there".to_string();
        host.caret = 8;
        engine.on_text_changed(&mut host);

        let after = engine.stats();
        assert_eq!(after.insert_passes, before.insert_passes + 1);
        assert_eq!(after.remove_passes, before.remove_passes);
        assert!(after.suppressed_notifications > before.suppressed_notifications);
        assert_eq!(host.text, "hi\u{00B7}there");
        assert_eq!(host.caret, 8);
        assert!(!engine.is_mutating());
    }

    #[test]
    fn test_engine_writes_happen_under_guard() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("a b\nc", 5, &engine);

        engine.attach(&mut host);

        assert!(host.writes > 0);
        assert_eq!(host.writes, host.writes_under_guard);
        assert!(!engine.is_mutating());
    }

    #[test]
    fn test_text_change_ignored_when_disabled() {
        let engine = Rc::new(MarkerTransformEngine::new(
            MarkerConfig::default().with_show_markers(false),
        ));
        let mut host = EchoHost::new("a b", 3, &engine);

        engine.on_text_changed(&mut host);

        assert_eq!(host.text, "a b");
        assert_eq!(engine.stats().insert_passes, 0);
    }

    #[test]
    fn test_unchanged_pass_does_not_write() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("a\u{00B7}b", 1, &engine);

        engine.on_text_changed(&mut host);

        assert_eq!(engine.stats().insert_passes, 1);
        assert_eq!(host.writes, 0);
    }

    #[test]
    fn test_caret_pulled_back_from_newline_marker() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("foo\u{00B6}\nbar", 4, &engine);

        engine.on_caret_changed(&mut host);

        assert_eq!(host.caret, 3);
        assert_eq!(engine.stats().caret_pullbacks, 1);
        // The echoed caret notification was swallowed, not re-checked
        assert_eq!(engine.stats().suppressed_notifications, 1);
        assert_eq!(host.writes, 1);
    }

    #[test]
    fn test_pull_back_moves_only_once() {
        let engine = Rc::new(MarkerTransformEngine::default());
        // Two adjacent markers: one event moves the caret a single step
        let mut host = EchoHost::new("a\u{00B6}\u{00B6}\nb", 3, &engine);

        engine.on_caret_changed(&mut host);

        assert_eq!(host.caret, 2);
        assert_eq!(engine.stats().caret_pullbacks, 1);
    }

    #[test]
    fn test_caret_not_pulled_back_from_space_marker() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("a\u{00B7}b", 2, &engine);

        engine.on_caret_changed(&mut host);

        assert_eq!(host.caret, 2);
        assert_eq!(host.writes, 0);
    }

    #[test]
    fn test_pull_back_skipped_when_disabled() {
        let engine = Rc::new(MarkerTransformEngine::new(
            MarkerConfig::default().with_show_markers(false),
        ));
        let mut host = EchoHost::new("foo\u{00B6}\nbar", 4, &engine);

        engine.on_caret_changed(&mut host);

        assert_eq!(host.caret, 4);
    }

    #[test]
    fn test_out_of_range_caret_is_clamped() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("ab", 10, &engine);

        engine.on_caret_changed(&mut host);
        assert_eq!(host.caret, 2);

        host.caret = 10;
        engine.on_text_changed(&mut host);
        assert_eq!(host.caret, 2);
    }

    #[test]
    fn test_guard_released_when_host_panics() {
        let engine = Rc::new(MarkerTransformEngine::default());
        let mut host = EchoHost::new("a b", 0, &engine);
        host.panic_on_set_text = true;

        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.attach(&mut host)));

        assert!(result.is_err());
        assert!(!engine.is_mutating());

        host.panic_on_set_text = false;
        engine.on_text_changed(&mut host);
        assert_eq!(host.text, "a\u{00B7}b");
    }

    #[test]
    fn test_copy_sanitized_when_enabled() {
        let engine = MarkerTransformEngine::default();
        let mut clipboard = VecClipboard(Vec::new());

        engine
            .copy_selection("a\u{00B7}b\u{00B6}", &mut clipboard)
            .unwrap();

        assert_eq!(clipboard.0, vec!["a b".to_string()]);
    }

    #[test]
    fn test_copy_verbatim_when_disabled() {
        let engine = MarkerTransformEngine::new(MarkerConfig::default().with_show_markers(false));
        assert_eq!(engine.on_copy_requested("a\u{00B7}b\u{00B6}"), "a\u{00B7}b\u{00B6}");
    }

    #[test]
    fn test_copy_empty_selection_is_noop() {
        let engine = MarkerTransformEngine::default();
        let mut clipboard = VecClipboard(Vec::new());

        engine.copy_selection("", &mut clipboard).unwrap();

        assert!(clipboard.0.is_empty());
    }

    #[test]
    fn test_copy_error_is_propagated() {
        init_logging();
        let engine = MarkerTransformEngine::default();
        let err = engine
            .copy_selection("x", &mut BrokenClipboard)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
