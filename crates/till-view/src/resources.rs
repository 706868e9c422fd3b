//! # Resource Tracking
//!
//! Every listener, timeout and interval a view creates through its tracked
//! helpers is recorded here and released in bulk on destroy.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Resource     Created by          Released by                           │
//! │  ────────     ──────────          ───────────                           │
//! │  listener     add_event_listener  remove_event_listeners (target side)  │
//! │  timeout      set_timeout         clear_timeouts   (task aborted)       │
//! │  interval     set_interval        clear_intervals  (task aborted)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::event::{EventTarget, ListenerId};

/// Identifies a tracked timeout or interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct TrackedListener {
    target: Arc<EventTarget>,
    event: String,
    id: ListenerId,
}

#[derive(Default)]
pub(crate) struct ResourceTracker {
    next_timer: u64,
    listeners: Vec<TrackedListener>,
    timeouts: Vec<(TimerId, JoinHandle<()>)>,
    intervals: Vec<(TimerId, JoinHandle<()>)>,
}

impl ResourceTracker {
    pub(crate) fn add_listener<F>(&mut self, target: &Arc<EventTarget>, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = target.add_listener(event, listener);
        self.listeners.push(TrackedListener {
            target: target.clone(),
            event: event.to_string(),
            id,
        });
        id
    }

    /// Spawns `task` after `delay`. Must run inside a tokio runtime.
    pub(crate) fn set_timeout<F, Fut>(&mut self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.bump();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        });
        self.timeouts.retain(|(_, h)| !h.is_finished());
        self.timeouts.push((id, handle));
        id
    }

    /// Runs `task` every `period`, first after one period.
    pub(crate) fn set_interval<F, Fut>(&mut self, period: Duration, mut task: F) -> TimerId
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.bump();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        self.intervals.push((id, handle));
        id
    }

    /// Cancels one timeout or interval. Returns `false` if unknown.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        for list in [&mut self.timeouts, &mut self.intervals] {
            if let Some(index) = list.iter().position(|(timer, _)| *timer == id) {
                let (_, handle) = list.remove(index);
                handle.abort();
                return true;
            }
        }
        false
    }

    pub(crate) fn remove_listeners(&mut self) -> usize {
        let count = self.listeners.len();
        for tracked in self.listeners.drain(..) {
            tracked.target.remove_listener(&tracked.event, tracked.id);
        }
        count
    }

    pub(crate) fn clear_timeouts(&mut self) -> usize {
        abort_all(&mut self.timeouts)
    }

    pub(crate) fn clear_intervals(&mut self) -> usize {
        abort_all(&mut self.intervals)
    }

    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        let pending = self.timeouts.iter().filter(|(_, h)| !h.is_finished()).count();
        (self.listeners.len(), pending, self.intervals.len())
    }

    fn bump(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }
}

fn abort_all(list: &mut Vec<(TimerId, JoinHandle<()>)>) -> usize {
    let count = list.len();
    for (_, handle) in list.drain(..) {
        handle.abort();
    }
    count
}
