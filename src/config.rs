//! Configuration management for SafeKeys.
//!
//! Values come from an optional configuration file overlaid with
//! `SAFEKEYS_`-prefixed environment variables, using `__` between section
//! and key (for example `SAFEKEYS_LOCKOUT__MAX_FAILURES=10`). The pepper is
//! top-level: `SAFEKEYS_PEPPER`.

use std::net::SocketAddr;
use std::path::Path;

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{Result, SafekeysError};

/// Main configuration for the SafeKeys service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafekeysConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Brute-force lockout configuration
    #[serde(default)]
    pub lockout: LockoutConfig,

    /// Password hashing cost parameters
    #[serde(default)]
    pub hashing: HashingConfig,

    /// Server-side secret appended to every password before hashing
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub pepper: SecretString,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// How often idle identities are evicted from the gates
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Deployment environment name, informational
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            sweep_interval_secs: default_sweep_interval(),
            environment: default_environment(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_environment() -> String {
    "development".to_string()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingConfig {
    /// Requests admitted per identity within the window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_rate_window")]
    pub window_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_rate_window(),
        }
    }
}

fn default_max_requests() -> u32 {
    60
}

fn default_rate_window() -> u64 {
    60
}

/// Brute-force lockout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    /// Failed verifications within the window that trigger a lock
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Window over which failures are counted, in seconds
    #[serde(default = "default_lockout_window")]
    pub window_secs: u64,

    /// How long a lock lasts, in seconds
    #[serde(default = "default_lock_duration")]
    pub lock_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            window_secs: default_lockout_window(),
            lock_secs: default_lock_duration(),
        }
    }
}

fn default_max_failures() -> u32 {
    5
}

fn default_lockout_window() -> u64 {
    300
}

fn default_lock_duration() -> u64 {
    600
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashingConfig {
    /// Number of passes
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    /// Memory in KiB
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    /// Degree of parallelism
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// Digest length in bytes
    #[serde(default = "default_hash_len")]
    pub hash_len: usize,

    /// Salt length in bytes
    #[serde(default = "default_salt_len")]
    pub salt_len: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            time_cost: default_time_cost(),
            memory_cost_kib: default_memory_cost(),
            parallelism: default_parallelism(),
            hash_len: default_hash_len(),
            salt_len: default_salt_len(),
        }
    }
}

fn default_time_cost() -> u32 {
    3
}

fn default_memory_cost() -> u32 {
    65536
}

fn default_parallelism() -> u32 {
    2
}

fn default_hash_len() -> usize {
    32
}

fn default_salt_len() -> usize {
    16
}

pub(crate) fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl SafekeysConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::build(builder.add_source(environment()))
    }

    /// Load configuration from a YAML string, ignoring the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: SafekeysConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the gates cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("server.sweep_interval_secs", self.server.sweep_interval_secs),
            (
                "rate_limiting.max_requests",
                u64::from(self.rate_limiting.max_requests),
            ),
            ("rate_limiting.window_secs", self.rate_limiting.window_secs),
            ("lockout.max_failures", u64::from(self.lockout.max_failures)),
            ("lockout.window_secs", self.lockout.window_secs),
            ("lockout.lock_secs", self.lockout.lock_secs),
        ];

        match positive.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(SafekeysError::must_be_positive(*field)),
            None => Ok(()),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("SAFEKEYS")
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use secrecy::ExposeSecret;
    use tokio_test::{assert_err, assert_ok};

    fn env_vars(vars: &[(&str, &str)]) -> Map<String, String> {
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SafekeysConfig::default();

        assert_eq!(config.server.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8000)));
        assert_eq!(config.rate_limiting.max_requests, 60);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.lockout.max_failures, 5);
        assert_eq!(config.lockout.window_secs, 300);
        assert_eq!(config.lockout.lock_secs, 600);
        assert_eq!(config.hashing.time_cost, 3);
        assert_eq!(config.hashing.memory_cost_kib, 65536);
        assert_eq!(config.hashing.parallelism, 2);
        assert_eq!(config.hashing.hash_len, 32);
        assert_eq!(config.hashing.salt_len, 16);
        assert_eq!(config.pepper.expose_secret(), "");
        assert_ok!(config.validate());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  bind_addr: "0.0.0.0:9000"
rate_limiting:
  max_requests: 10
lockout:
  lock_secs: 30
pepper: s3cret
"#;
        let config = SafekeysConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.server.sweep_interval_secs, 60);
        assert_eq!(config.rate_limiting.max_requests, 10);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.lockout.lock_secs, 30);
        assert_eq!(config.lockout.max_failures, 5);
        assert_eq!(config.pepper.expose_secret(), "s3cret");
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let err = assert_err!(SafekeysConfig::from_yaml("lockout:\n  max_failures: 0\n"));
        assert!(matches!(
            err,
            SafekeysError::InvalidConfig { field: "lockout.max_failures", .. }
        ));

        let err = assert_err!(SafekeysConfig::from_yaml("rate_limiting:\n  window_secs: 0\n"));
        assert!(matches!(
            err,
            SafekeysError::InvalidConfig { field: "rate_limiting.window_secs", .. }
        ));
    }

    #[test]
    fn test_malformed_yaml_is_a_config_error() {
        let err = assert_err!(SafekeysConfig::from_yaml("rate_limiting:\n  max_requests: many\n"));
        assert!(matches!(err, SafekeysError::Config(_)));
    }

    #[test]
    fn test_pepper_is_redacted_in_debug() {
        let config = SafekeysConfig::from_yaml("pepper: s3cret\n").unwrap();
        assert!(!format!("{:?}", config).contains("s3cret"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let yaml = r#"
rate_limiting:
  max_requests: 10
  window_secs: 30
lockout:
  lock_secs: 30
pepper: from-file
"#;
        let env = env_vars(&[
            ("SAFEKEYS_RATE_LIMITING__MAX_REQUESTS", "25"),
            ("SAFEKEYS_LOCKOUT__MAX_FAILURES", "3"),
            ("SAFEKEYS_SERVER__BIND_ADDR", "0.0.0.0:9100"),
            ("SAFEKEYS_PEPPER", "from-env"),
        ]);
        let builder = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .add_source(environment().source(Some(env)));

        let config = SafekeysConfig::build(builder).unwrap();

        assert_eq!(config.rate_limiting.max_requests, 25);
        assert_eq!(config.rate_limiting.window_secs, 30);
        assert_eq!(config.lockout.max_failures, 3);
        assert_eq!(config.lockout.lock_secs, 30);
        assert_eq!(config.lockout.window_secs, 300);
        assert_eq!(config.server.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9100)));
        assert_eq!(config.pepper.expose_secret(), "from-env");
    }

    #[test]
    fn test_environment_pepper_is_kept_verbatim() {
        for raw in ["007123", "1e3", "TRUE", "18446744073709551616"] {
            let env = env_vars(&[("SAFEKEYS_PEPPER", raw)]);
            let builder = Config::builder().add_source(environment().source(Some(env)));

            let config = SafekeysConfig::build(builder).unwrap();

            assert_eq!(config.pepper.expose_secret(), raw);
        }
    }

    #[test]
    fn test_environment_numbers_are_still_validated() {
        let env = env_vars(&[("SAFEKEYS_LOCKOUT__LOCK_SECS", "0")]);
        let builder = Config::builder().add_source(environment().source(Some(env)));
        let err = assert_err!(SafekeysConfig::build(builder));
        assert!(matches!(
            err,
            SafekeysError::InvalidConfig { field: "lockout.lock_secs", .. }
        ));

        let env = env_vars(&[("SAFEKEYS_RATE_LIMITING__WINDOW_SECS", "soon")]);
        let builder = Config::builder().add_source(environment().source(Some(env)));
        let err = assert_err!(SafekeysConfig::build(builder));
        assert!(matches!(err, SafekeysError::Config(_)));
    }

    // The only test that touches the process environment.
    #[test]
    fn test_load_reads_pepper_from_process_environment() {
        std::env::set_var("SAFEKEYS_PEPPER", "007123");
        let loaded = SafekeysConfig::load(None);
        std::env::remove_var("SAFEKEYS_PEPPER");

        let config = loaded.unwrap();
        assert_eq!(config.pepper.expose_secret(), "007123");
    }
}
