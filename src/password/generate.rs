//! Random password and token generation.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Characters generated passwords are drawn from.
pub const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()";

/// Generate a password of `length` characters from [`PASSWORD_CHARSET`].
pub fn generate_password(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Generate `bytes` random bytes, hex encoded (twice as many characters).
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_and_charset() {
        let password = generate_password(64);

        assert_eq!(password.chars().count(), 64);
        assert!(password.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
    }

    #[test]
    fn test_passwords_differ() {
        assert_ne!(generate_password(32), generate_password(32));
    }

    #[test]
    fn test_token_is_hex() {
        let token = generate_token(32);

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex::decode(&token).unwrap().len(), 32);
    }

    #[test]
    fn test_zero_length() {
        assert!(generate_password(0).is_empty());
        assert!(generate_token(0).is_empty());
    }
}
