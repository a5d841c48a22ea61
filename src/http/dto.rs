use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::config::deserialize_secret;

#[derive(Debug, Deserialize)]
pub struct LengthQuery {
    pub length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PasswordResponse {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct HashPasswordRequest {
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct HashPasswordResponse {
    pub hashed_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    pub hashed_password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
