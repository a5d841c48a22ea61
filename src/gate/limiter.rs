//! Per-identity sliding-window rate limiter.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::clock::{SystemClock, TimeSource};
use super::sweep::Sweep;
use super::window::{Decision, EventWindow};
use crate::error::{Result, SafekeysError};

/// Admits at most `max_requests` requests per identity within any trailing
/// window of `window` length.
///
/// Identities live in a sharded map; the trim, count and append for one
/// identity all happen under that identity's shard lock, so concurrent
/// requests cannot both slip under the limit.
pub struct RateLimiter {
    /// Admitted request instants indexed by identity
    windows: DashMap<String, EventWindow>,
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn TimeSource>,
}

impl RateLimiter {
    /// Create a rate limiter backed by the system clock.
    pub fn new(max_requests: u32, window_secs: u64) -> Result<Self> {
        Self::with_clock(max_requests, window_secs, Arc::new(SystemClock))
    }

    /// Create a rate limiter reading time from `clock`.
    pub fn with_clock(
        max_requests: u32,
        window_secs: u64,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        if max_requests == 0 {
            return Err(SafekeysError::must_be_positive("max_requests"));
        }
        if window_secs == 0 {
            return Err(SafekeysError::must_be_positive("window_secs"));
        }

        Ok(Self {
            windows: DashMap::new(),
            max_requests: max_requests as usize,
            window: Duration::from_secs(window_secs),
            clock,
        })
    }

    /// Check whether `identity` may make another request right now.
    ///
    /// Admitted requests are recorded; denied ones are not, so a client that
    /// keeps retrying while limited does not extend its own penalty.
    pub fn check(&self, identity: &str) -> Decision {
        let mut log = match self.windows.get_mut(identity) {
            Some(log) => log,
            None => self.windows.entry(identity.to_owned()).or_default(),
        };

        // Read the clock under the shard lock so events stay ordered.
        let now = self.clock.now();
        log.trim(now, self.window);

        trace!(
            identity = %identity,
            recent = log.len(),
            limit = self.max_requests,
            "Checking rate limit"
        );

        if log.len() >= self.max_requests {
            let decision = match log.oldest() {
                Some(oldest) => Decision::deny_until(oldest + self.window, now),
                None => Decision::deny(1),
            };
            debug!(
                identity = %identity,
                retry_after_secs = decision.retry_after_secs,
                "Rate limit exceeded"
            );
            return decision;
        }

        log.record(now);
        Decision::allow()
    }

    /// Number of requests currently counted against `identity`.
    ///
    /// Events that have aged out but not been trimmed yet are included.
    pub fn recorded(&self, identity: &str) -> usize {
        self.windows.get(identity).map_or(0, |log| log.len())
    }

    /// The configured request limit.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// The configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Clear all tracked identities.
    pub fn clear(&self) {
        self.windows.clear();
    }
}

impl Sweep for RateLimiter {
    fn sweep(&self) -> usize {
        let before = self.windows.len();
        let now = self.clock.now();
        self.windows.retain(|_, log| {
            log.trim(now, self.window);
            !log.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    fn name(&self) -> &'static str {
        "rate_limiter"
    }
}
