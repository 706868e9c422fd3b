//! # Page Chrome
//!
//! Document-level side effects (title, body marker classes) go through this
//! capability instead of touching a global document, so the router and views
//! stay testable without a real browser.

use std::collections::BTreeSet;

use parking_lot::Mutex;

/// Page chrome capability.
pub trait Chrome: Send + Sync {
    /// Sets the document title.
    fn set_title(&self, title: &str);

    /// Adds a marker class to the document body.
    fn add_marker_class(&self, class: &str);

    /// Removes a marker class from the document body.
    fn remove_marker_class(&self, class: &str);
}

/// Chrome that ignores every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChrome;

impl Chrome for NoopChrome {
    fn set_title(&self, _title: &str) {}
    fn add_marker_class(&self, _class: &str) {}
    fn remove_marker_class(&self, _class: &str) {}
}

/// Chrome that keeps the current title and class set in memory.
///
/// Used by the console host and throughout the tests.
#[derive(Debug, Default)]
pub struct RecordingChrome {
    inner: Mutex<ChromeState>,
}

#[derive(Debug, Default)]
struct ChromeState {
    title: String,
    classes: BTreeSet<String>,
}

impl RecordingChrome {
    /// Creates an empty recording chrome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document title.
    pub fn title(&self) -> String {
        self.inner.lock().title.clone()
    }

    /// Current marker classes, sorted.
    pub fn classes(&self) -> Vec<String> {
        self.inner.lock().classes.iter().cloned().collect()
    }

    /// True if `class` is currently applied.
    pub fn has_class(&self, class: &str) -> bool {
        self.inner.lock().classes.contains(class)
    }
}

impl Chrome for RecordingChrome {
    fn set_title(&self, title: &str) {
        self.inner.lock().title = title.to_string();
    }

    fn add_marker_class(&self, class: &str) {
        self.inner.lock().classes.insert(class.to_string());
    }

    fn remove_marker_class(&self, class: &str) {
        self.inner.lock().classes.remove(class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_chrome() {
        let chrome = RecordingChrome::new();
        chrome.set_title("Dashboard - Till");
        chrome.add_marker_class("view-dashboard");
        chrome.add_marker_class("route-dashboard");
        chrome.remove_marker_class("route-dashboard");

        assert_eq!(chrome.title(), "Dashboard - Till");
        assert_eq!(chrome.classes(), vec!["view-dashboard".to_string()]);
        assert!(!chrome.has_class("route-dashboard"));
    }
}
