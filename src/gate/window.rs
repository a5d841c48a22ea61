//! Sliding-window event log and gate decisions.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of a gate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Seconds the caller should wait before retrying; zero when allowed
    pub retry_after_secs: u64,
}

impl Decision {
    /// An admitting decision.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    /// A denying decision. The retry hint is never below one second.
    pub fn deny(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            retry_after_secs: retry_after_secs.max(1),
        }
    }

    /// Deny until the given instant, rounding the wait up to whole seconds.
    pub(crate) fn deny_until(until: Instant, now: Instant) -> Self {
        Self::deny(ceil_secs(until.saturating_duration_since(now)))
    }

    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Time-ordered log of events recorded against one identity.
///
/// Events are appended in ascending order and trimmed from the oldest end,
/// so each event is pushed and popped exactly once.
#[derive(Debug, Default)]
pub(crate) struct EventWindow {
    events: VecDeque<Instant>,
}

impl EventWindow {
    /// Drop every event strictly older than `now - window`.
    pub(crate) fn trim(&mut self, now: Instant, window: Duration) {
        // Nothing can be older than an instant before the clock's origin.
        let Some(window_start) = now.checked_sub(window) else {
            return;
        };

        while self
            .events
            .front()
            .is_some_and(|&event| event < window_start)
        {
            self.events.pop_front();
        }
    }

    pub(crate) fn record(&mut self, at: Instant) {
        debug_assert!(self.events.back().map_or(true, |&last| last <= at));
        self.events.push_back(at);
    }

    pub(crate) fn oldest(&self) -> Option<Instant> {
        self.events.front().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}
