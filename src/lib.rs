//! SafeKeys - password and token utilities behind request gates
//!
//! This crate exposes password hashing, verification and random credential
//! generation over HTTP. Every request passes a per-identity sliding-window
//! rate limiter, and password verification is additionally guarded by a
//! brute-force lockout. Passwords are hashed with Argon2id after appending a
//! server-side pepper.

pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod password;
