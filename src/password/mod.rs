//! Password hashing and random credential generation.

mod generate;
mod hasher;

pub use generate::{generate_password, generate_token, PASSWORD_CHARSET};
pub use hasher::{EncodedHash, PasswordHasher};
