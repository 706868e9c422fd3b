//! # Link Interception
//!
//! Decides whether an anchor click stays inside the app.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Intercepted only when ALL hold:                                        │
//! │    • primary button (0)                                                 │
//! │    • no ctrl / meta / shift / alt                                       │
//! │    • no `target` attribute                                              │
//! │    • no `download` attribute                                            │
//! │    • href resolves to the app origin                                    │
//! │                                                                         │
//! │  Anything else falls through to the browser's default behavior.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use url::Url;

const LOCAL_BASE: &str = "http://localhost/";

/// The parts of an anchor click the router cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClick {
    pub href: String,
    pub target: Option<String>,
    pub download: bool,
    /// Mouse button, 0 is primary.
    pub button: u16,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
}

impl LinkClick {
    /// A plain primary-button click on `href`.
    pub fn new(href: impl Into<String>) -> Self {
        LinkClick {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_download(mut self) -> Self {
        self.download = true;
        self
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = button;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    /// True if any modifier key was held.
    pub fn is_modified(&self) -> bool {
        self.ctrl_key || self.meta_key || self.shift_key || self.alt_key
    }

    /// Resolves the in-app target for this click.
    ///
    /// `origin` is the app origin (`None` means only relative links count as
    /// same-origin); `current` is the location the link is clicked from.
    /// Returns `None` when the browser should handle the click.
    pub fn in_app_target(&self, origin: Option<&Url>, current: &str) -> Option<String> {
        if self.button != 0 || self.is_modified() || self.download {
            return None;
        }
        if self.target.as_deref().is_some_and(|t| !t.is_empty()) {
            return None;
        }

        let href = self.href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let base = match origin {
            Some(origin) => origin.clone(),
            None => Url::parse(LOCAL_BASE).ok()?,
        };
        let base = base.join(current).ok()?;
        let resolved = base.join(href).ok()?;
        if resolved.origin() != base.origin() {
            return None;
        }

        let mut target = resolved.path().to_string();
        if let Some(query) = resolved.query() {
            target.push('?');
            target.push_str(query);
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://till.example.com/").unwrap()
    }

    #[test]
    fn test_plain_links_are_intercepted() {
        let origin = origin();
        assert_eq!(
            LinkClick::new("/products/42").in_app_target(Some(&origin), "/"),
            Some("/products/42".to_string())
        );
        assert_eq!(
            LinkClick::new("https://till.example.com/pos?tab=cart").in_app_target(Some(&origin), "/"),
            Some("/pos?tab=cart".to_string())
        );
        // relative to the current location
        assert_eq!(
            LinkClick::new("42").in_app_target(Some(&origin), "/products/"),
            Some("/products/42".to_string())
        );
    }

    #[test]
    fn test_browser_handled_clicks() {
        let origin = origin();
        let cases = [
            LinkClick::new("/pos").with_target("_blank"),
            LinkClick::new("/report.csv").with_download(),
            LinkClick::new("/pos").with_button(1),
            LinkClick::new("/pos").with_ctrl(),
            LinkClick::new("/pos").with_meta(),
            LinkClick::new("https://elsewhere.example.com/pos"),
            LinkClick::new("mailto:owner@example.com"),
            LinkClick::new("#top"),
        ];
        for click in cases {
            assert_eq!(click.in_app_target(Some(&origin), "/"), None, "{click:?}");
        }
    }

    #[test]
    fn test_without_origin_absolute_links_leave() {
        assert_eq!(LinkClick::new("https://till.example.com/pos").in_app_target(None, "/"), None);
        assert_eq!(
            LinkClick::new("/pos").in_app_target(None, "/"),
            Some("/pos".to_string())
        );
    }
}
