//! Brute-force lockout for credential verification.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use super::clock::{SystemClock, TimeSource};
use super::sweep::Sweep;
use super::window::{Decision, EventWindow};
use crate::error::{Result, SafekeysError};

/// Lockout state for one identity.
#[derive(Debug, Default)]
struct LockoutEntry {
    /// Recent failed attempts, oldest first
    failures: EventWindow,
    /// When the current lock lifts, if one was imposed
    locked_until: Option<Instant>,
}

impl LockoutEntry {
    fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// Locks an identity out for `lock` after `max_failures` failed
/// verifications within `window`.
///
/// An expired lock is never cleared eagerly: it simply stops comparing as
/// active, and the sweep removes it later.
pub struct LockoutGuard {
    entries: DashMap<String, LockoutEntry>,
    max_failures: usize,
    window: Duration,
    lock: Duration,
    clock: Arc<dyn TimeSource>,
}

impl LockoutGuard {
    /// Create a lockout guard backed by the system clock.
    pub fn new(max_failures: u32, window_secs: u64, lock_secs: u64) -> Result<Self> {
        Self::with_clock(max_failures, window_secs, lock_secs, Arc::new(SystemClock))
    }

    /// Create a lockout guard reading time from `clock`.
    pub fn with_clock(
        max_failures: u32,
        window_secs: u64,
        lock_secs: u64,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        if max_failures == 0 {
            return Err(SafekeysError::must_be_positive("max_failures"));
        }
        if window_secs == 0 {
            return Err(SafekeysError::must_be_positive("window_secs"));
        }
        if lock_secs == 0 {
            return Err(SafekeysError::must_be_positive("lock_secs"));
        }

        Ok(Self {
            entries: DashMap::new(),
            max_failures: max_failures as usize,
            window: Duration::from_secs(window_secs),
            lock: Duration::from_secs(lock_secs),
            clock,
        })
    }

    /// Check whether `identity` is currently locked out.
    ///
    /// This is a pure read: failure counts and expired locks are untouched.
    pub fn is_blocked(&self, identity: &str) -> Decision {
        let Some(entry) = self.entries.get(identity) else {
            return Decision::allow();
        };

        let now = self.clock.now();
        match entry.locked_until {
            Some(until) if until > now => Decision::deny_until(until, now),
            _ => Decision::allow(),
        }
    }

    /// Record a failed verification for `identity`, locking it out once the
    /// threshold is reached within the window.
    pub fn register_failure(&self, identity: &str) {
        let mut entry = match self.entries.get_mut(identity) {
            Some(entry) => entry,
            None => self.entries.entry(identity.to_owned()).or_default(),
        };

        let now = self.clock.now();
        entry.failures.trim(now, self.window);
        entry.failures.record(now);

        trace!(
            identity = %identity,
            failures = entry.failures.len(),
            threshold = self.max_failures,
            "Registered failed attempt"
        );

        if entry.failures.len() >= self.max_failures {
            entry.locked_until = Some(now + self.lock);
            entry.failures.clear();
            warn!(
                identity = %identity,
                lock_secs = self.lock.as_secs(),
                "Too many failed attempts, identity locked"
            );
        }
    }

    /// Forget all failures and any lock for `identity`.
    pub fn reset(&self, identity: &str) {
        if self.entries.remove(identity).is_some() {
            debug!(identity = %identity, "Lockout state reset");
        }
    }

    /// Failures currently counted against `identity` since its last lock.
    pub fn failures(&self, identity: &str) -> usize {
        self.entries
            .get(identity)
            .map_or(0, |entry| entry.failures.len())
    }

    /// Clear all tracked identities.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Sweep for LockoutGuard {
    fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = self.clock.now();
        self.entries.retain(|_, entry| {
            entry.failures.trim(now, self.window);
            entry.is_locked(now) || !entry.failures.is_empty()
        });
        before.saturating_sub(self.entries.len())
    }

    fn tracked_identities(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &'static str {
        "lockout_guard"
    }
}
