//! # Notifications
//!
//! Fire-and-forget toasts. Views only see the [`Notifier`] trait; the
//! [`NotificationCenter`] keeps the visible stack and its auto-hide timers.
//!
//! ## Auto-Hide Timing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  show(3000ms) ──────────── 1200ms ────────── pause ── … ── resume       │
//! │  remaining = 3000                             remaining = 1800          │
//! │  timer armed for 3000                         timer aborted   re-armed  │
//! │                                                               for 1800  │
//! │                                                                         │
//! │  Elapsed time is measured with tokio's clock, so a toast always gets    │
//! │  exactly its configured display time across any number of pauses.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastLevel::Success => "success",
            ToastLevel::Error => "error",
            ToastLevel::Warning => "warning",
            ToastLevel::Info => "info",
        }
    }
}

/// Notification collaborator used by views.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(ToastLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(ToastLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.notify(ToastLevel::Warning, message);
    }

    fn info(&self, message: &str) {
        self.notify(ToastLevel::Info, message);
    }
}

/// Notification center settings.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationConfig {
    /// Display time; zero keeps toasts until dismissed.
    pub default_duration: Duration,
    /// Oldest toasts are evicted beyond this many.
    pub max_visible: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            default_duration: Duration::from_millis(3000),
            max_visible: 5,
        }
    }
}

/// A visible toast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub message: String,
}

struct Entry {
    toast: Toast,
    remaining: Duration,
    armed_at: Instant,
    paused: bool,
    timer: Option<JoinHandle<()>>,
}

type Stack = Arc<Mutex<Vec<Entry>>>;

/// Toast stack with auto-hide.
pub struct NotificationCenter {
    config: NotificationConfig,
    stack: Stack,
}

impl NotificationCenter {
    pub fn new(config: NotificationConfig) -> Self {
        NotificationCenter {
            config,
            stack: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shows a toast with the default duration.
    pub fn show(&self, level: ToastLevel, message: &str) -> Uuid {
        self.show_for(level, message, self.config.default_duration)
    }

    /// Shows a toast for `duration`.
    pub fn show_for(&self, level: ToastLevel, message: &str, duration: Duration) -> Uuid {
        let id = Uuid::new_v4();
        let mut entry = Entry {
            toast: Toast {
                id,
                level,
                message: message.to_string(),
            },
            remaining: duration,
            armed_at: Instant::now(),
            paused: false,
            timer: None,
        };
        entry.timer = arm(&self.stack, id, duration);

        let mut stack = self.stack.lock();
        stack.push(entry);
        while stack.len() > self.config.max_visible.max(1) {
            let evicted = stack.remove(0);
            if let Some(timer) = evicted.timer {
                timer.abort();
            }
            debug!(id = %evicted.toast.id, "Toast evicted");
        }
        debug!(%id, level = level.as_str(), "Toast shown");
        id
    }

    /// Removes a toast. Returns `false` if it is no longer visible.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut stack = self.stack.lock();
        match stack.iter().position(|e| e.toast.id == id) {
            Some(index) => {
                if let Some(timer) = stack.remove(index).timer {
                    timer.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Stops the auto-hide countdown (e.g. while hovered).
    pub fn pause_auto_hide(&self, id: Uuid) -> bool {
        let mut stack = self.stack.lock();
        let Some(entry) = stack.iter_mut().find(|e| e.toast.id == id) else {
            return false;
        };
        if entry.paused {
            return true;
        }
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        entry.remaining = entry.remaining.saturating_sub(entry.armed_at.elapsed());
        entry.paused = true;
        debug!(%id, remaining_ms = entry.remaining.as_millis() as u64, "Toast paused");
        true
    }

    /// Restarts the countdown with the time that was left at pause.
    pub fn resume_auto_hide(&self, id: Uuid) -> bool {
        let mut stack = self.stack.lock();
        let Some(entry) = stack.iter_mut().find(|e| e.toast.id == id) else {
            return false;
        };
        if !entry.paused {
            return true;
        }
        entry.paused = false;
        entry.armed_at = Instant::now();
        entry.timer = arm(&self.stack, id, entry.remaining);
        true
    }

    /// Time left before the toast hides, if it is visible.
    pub fn remaining(&self, id: Uuid) -> Option<Duration> {
        let stack = self.stack.lock();
        let entry = stack.iter().find(|e| e.toast.id == id)?;
        Some(if entry.paused {
            entry.remaining
        } else {
            entry.remaining.saturating_sub(entry.armed_at.elapsed())
        })
    }

    /// Visible toasts, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        self.stack.lock().iter().map(|e| e.toast.clone()).collect()
    }

    pub fn clear(&self) {
        for entry in self.stack.lock().drain(..) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, level: ToastLevel, message: &str) {
        self.show(level, message);
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("config", &self.config)
            .field("visible", &self.stack.lock().len())
            .finish()
    }
}

/// Spawns the hide timer. Outside a runtime the toast stays until dismissed.
fn arm(stack: &Stack, id: Uuid, after: Duration) -> Option<JoinHandle<()>> {
    if after.is_zero() {
        return None;
    }
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!(%id, "No async runtime, toast will not auto-hide");
            return None;
        }
    };

    let stack = Arc::downgrade(stack);
    Some(runtime.spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(stack) = stack.upgrade() {
            stack.lock().retain(|e| e.toast.id != id);
            debug!(%id, "Toast hidden");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(max_visible: usize) -> NotificationCenter {
        NotificationCenter::new(NotificationConfig {
            default_duration: Duration::from_millis(3000),
            max_visible,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_auto_hides() {
        let center = center(5);
        center.success("Sale completed");
        assert_eq!(center.visible().len(), 1);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(center.visible().len(), 1);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_keeps_true_remaining_time() {
        let center = center(5);
        let id = center.show(ToastLevel::Info, "Printer reconnected");

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(center.pause_auto_hide(id));
        assert_eq!(center.remaining(id), Some(Duration::from_millis(1800)));

        // paused: no countdown
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(center.visible().len(), 1);

        assert!(center.resume_auto_hide(id));
        tokio::time::sleep(Duration::from_millis(1799)).await;
        assert_eq!(center.visible().len(), 1);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.visible().is_empty());
        assert!(!center.resume_auto_hide(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oldest_toast_evicted() {
        let center = center(2);
        center.info("one");
        center.warning("two");
        center.error("three");

        let messages: Vec<String> = center.visible().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let center = center(5);
        let id = center.show_for(ToastLevel::Error, "Card declined", Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(center.visible().len(), 1);

        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert!(center.visible().is_empty());
    }
}
