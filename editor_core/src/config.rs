//! Engine configuration.

/// Settings for a [`MarkerTransformEngine`](crate::MarkerTransformEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerConfig {
    /// Whether markers are shown when the engine is attached to a host.
    pub show_markers: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self { show_markers: true }
    }
}

impl MarkerConfig {
    pub fn with_show_markers(mut self, show_markers: bool) -> Self {
        self.show_markers = show_markers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_shown_by_default() {
        assert!(MarkerConfig::default().show_markers);
        assert!(!MarkerConfig::default().with_show_markers(false).show_markers);
    }
}
