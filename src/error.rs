//! Error types for the SafeKeys service.

use thiserror::Error;

/// Main error type for SafeKeys operations.
#[derive(Error, Debug)]
pub enum SafekeysError {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration value is outside its accepted range
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// Password hash derivation errors
    #[error("Hash error: {0}")]
    Hash(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SafekeysError {
    /// Shorthand for a zero value where a positive one is required.
    pub(crate) fn must_be_positive(field: &'static str) -> Self {
        SafekeysError::InvalidConfig {
            field,
            reason: "must be greater than zero",
        }
    }
}

impl From<config::ConfigError> for SafekeysError {
    fn from(e: config::ConfigError) -> Self {
        SafekeysError::Config(e.to_string())
    }
}

/// Result type alias for SafeKeys operations.
pub type Result<T> = std::result::Result<T, SafekeysError>;
