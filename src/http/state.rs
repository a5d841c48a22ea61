use std::sync::Arc;

use secrecy::SecretString;

use crate::config::SafekeysConfig;
use crate::error::Result;
use crate::gate::{LockoutGuard, RateLimiter};
use crate::password::PasswordHasher;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub lockout: Arc<LockoutGuard>,
    pub hasher: Arc<PasswordHasher>,
    pub pepper: Arc<SecretString>,
}

impl AppState {
    /// Build the gates and the hasher, failing on invalid configuration.
    pub fn from_config(config: &SafekeysConfig) -> Result<Self> {
        let rate_limiter = RateLimiter::new(
            config.rate_limiting.max_requests,
            config.rate_limiting.window_secs,
        )?;
        let lockout = LockoutGuard::new(
            config.lockout.max_failures,
            config.lockout.window_secs,
            config.lockout.lock_secs,
        )?;
        let hasher = PasswordHasher::new(&config.hashing)?;

        Ok(Self {
            rate_limiter: Arc::new(rate_limiter),
            lockout: Arc::new(lockout),
            hasher: Arc::new(hasher),
            pepper: Arc::new(config.pepper.clone()),
        })
    }
}
