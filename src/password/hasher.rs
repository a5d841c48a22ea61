//! Peppered Argon2id password hashing.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::trace;

use crate::config::HashingConfig;
use crate::error::{Result, SafekeysError};

/// Smallest salt Argon2 accepts, in bytes.
const MIN_SALT_LEN: usize = 8;
/// Largest salt that still fits a PHC salt field once base64 encoded.
const MAX_SALT_LEN: usize = 48;

/// A self-describing PHC hash string
/// (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<digest>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHash(String);

impl EncodedHash {
    /// Borrow the PHC string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the PHC string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for EncodedHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every way a verification can fail. All of them look the same to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerifyFailure {
    /// The stored string is not a parseable PHC hash
    Malformed,
    /// Not Argon2id, invalid parameters, or costs above this hasher's own
    UnsupportedParams,
    /// The digest did not match
    Mismatch,
}

/// Argon2id hasher with fixed cost parameters.
///
/// The pepper is supplied on every call and never stored, here or in the
/// encoded output.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    salt_len: usize,
}

impl PasswordHasher {
    /// Create a hasher, rejecting cost parameters Argon2 would refuse.
    pub fn new(config: &HashingConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            Some(config.hash_len),
        )
        .map_err(|e| SafekeysError::Config(format!("Invalid hashing parameters: {}", e)))?;

        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&config.salt_len) {
            return Err(SafekeysError::InvalidConfig {
                field: "hashing.salt_len",
                reason: "must be between 8 and 48 bytes",
            });
        }

        Ok(Self {
            params,
            salt_len: config.salt_len,
        })
    }

    /// Hash `password` with `pepper` under a fresh random salt.
    ///
    /// Fails only if the peppered input exceeds Argon2's length limit.
    pub fn hash(&self, password: &str, pepper: &SecretString) -> Result<EncodedHash> {
        let mut salt = vec![0u8; self.salt_len];
        OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| SafekeysError::Hash(e.to_string()))?;

        let input = peppered(password, pepper);
        let hash = self
            .argon2()
            .hash_password(input.expose_secret().as_bytes(), &salt)
            .map_err(|e| SafekeysError::Hash(e.to_string()))?;

        Ok(EncodedHash(hash.to_string()))
    }

    /// Check `password` with `pepper` against a stored hash.
    ///
    /// Returns `false` for a wrong password or pepper and for any stored
    /// string that cannot be verified, without saying which.
    pub fn verify(&self, password: &str, pepper: &SecretString, encoded: &str) -> bool {
        match self.try_verify(password, pepper, encoded) {
            Ok(()) => true,
            Err(
                failure @ (VerifyFailure::Malformed
                | VerifyFailure::UnsupportedParams
                | VerifyFailure::Mismatch),
            ) => {
                trace!(failure = ?failure, "Password verification failed");
                false
            }
        }
    }

    fn try_verify(
        &self,
        password: &str,
        pepper: &SecretString,
        encoded: &str,
    ) -> std::result::Result<(), VerifyFailure> {
        let parsed = PasswordHash::new(encoded).map_err(|_| VerifyFailure::Malformed)?;

        let algorithm =
            Algorithm::try_from(parsed.algorithm).map_err(|_| VerifyFailure::UnsupportedParams)?;
        if algorithm != Algorithm::Argon2id {
            return Err(VerifyFailure::UnsupportedParams);
        }

        // Stored costs come from the caller; cap them at ours.
        let params = Params::try_from(&parsed).map_err(|_| VerifyFailure::UnsupportedParams)?;
        if params.m_cost() > self.params.m_cost()
            || params.t_cost() > self.params.t_cost()
            || params.p_cost() > self.params.p_cost()
        {
            return Err(VerifyFailure::UnsupportedParams);
        }

        let input = peppered(password, pepper);
        self.argon2()
            .verify_password(input.expose_secret().as_bytes(), &parsed)
            .map_err(|_| VerifyFailure::Mismatch)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn peppered(password: &str, pepper: &SecretString) -> SecretString {
    let mut input = String::with_capacity(password.len() + pepper.expose_secret().len());
    input.push_str(password);
    input.push_str(pepper.expose_secret());
    SecretString::from(input)
}
