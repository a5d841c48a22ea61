//! Request gating: per-identity rate limiting and brute-force lockout.

mod clock;
mod limiter;
mod lockout;
mod sweep;
mod window;

pub use clock::{SystemClock, TimeSource};
pub use limiter::RateLimiter;
pub use lockout::LockoutGuard;
pub use sweep::{spawn_sweeper, Sweep};
pub use window::Decision;
