//! Time sources for the gates.

use std::time::Instant;

#[cfg(test)]
pub(crate) use manual::ManualClock;

/// Abstract source of the current instant.
///
/// The gates only ever compare instants they obtained from the same source,
/// so a monotonic clock is sufficient.
pub trait TimeSource: Send + Sync {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Default time source backed by the monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_manual_clock_handles_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let start = handle.now();

        clock.advance_secs(30);

        assert_eq!(handle.now() - start, Duration::from_secs(30));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
