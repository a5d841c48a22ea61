//! Route table and request handlers.

use std::ops::RangeInclusive;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use secrecy::ExposeSecret;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::dto::{
    HashPasswordRequest, HashPasswordResponse, HealthResponse, LengthQuery, PasswordResponse,
    TokenResponse, VerifyPasswordRequest, VerifyPasswordResponse,
};
use super::error::ApiError;
use super::middleware::{rate_limit, ClientIdentity};
use super::state::AppState;
use crate::password;

const PASSWORD_LENGTH: RangeInclusive<usize> = 8..=128;
const DEFAULT_PASSWORD_LENGTH: usize = 16;
const TOKEN_BYTES: RangeInclusive<usize> = 16..=64;
const DEFAULT_TOKEN_BYTES: usize = 32;
/// Accepted length of a submitted plaintext password, in characters
const SUBMITTED_PASSWORD_LENGTH: RangeInclusive<usize> = 12..=128;
const ENCODED_HASH_LENGTH: RangeInclusive<usize> = 20..=512;

/// Build the application router.
///
/// Everything except `/health` sits behind the rate limiter.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/generate/password", get(generate_password))
        .route("/generate/token", get(generate_token))
        .route("/security/hash", post(hash_password))
        .route("/security/verify", post(verify_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_password(
    query: Result<Query<LengthQuery>, QueryRejection>,
) -> Result<Json<PasswordResponse>, ApiError> {
    let Query(query) = query?;
    let length = in_range(
        "length",
        query.length.unwrap_or(DEFAULT_PASSWORD_LENGTH),
        &PASSWORD_LENGTH,
    )?;

    Ok(Json(PasswordResponse {
        password: password::generate_password(length),
    }))
}

async fn generate_token(
    query: Result<Query<LengthQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Query(query) = query?;
    let bytes = in_range(
        "length",
        query.length.unwrap_or(DEFAULT_TOKEN_BYTES),
        &TOKEN_BYTES,
    )?;

    Ok(Json(TokenResponse {
        token: password::generate_token(bytes),
    }))
}

async fn hash_password(
    State(state): State<AppState>,
    payload: Result<Json<HashPasswordRequest>, JsonRejection>,
) -> Result<Json<HashPasswordResponse>, ApiError> {
    let Json(request) = payload?;
    in_range(
        "password",
        request.password.expose_secret().chars().count(),
        &SUBMITTED_PASSWORD_LENGTH,
    )?;

    let hasher = state.hasher.clone();
    let pepper = state.pepper.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        hasher.hash(request.password.expose_secret(), &pepper)
    })
    .await??;

    Ok(Json(HashPasswordResponse {
        hashed_password: encoded.into_string(),
    }))
}

async fn verify_password(
    State(state): State<AppState>,
    Extension(identity): Extension<ClientIdentity>,
    payload: Result<Json<VerifyPasswordRequest>, JsonRejection>,
) -> Result<Json<VerifyPasswordResponse>, ApiError> {
    let Json(request) = payload?;
    in_range(
        "password",
        request.password.expose_secret().chars().count(),
        &SUBMITTED_PASSWORD_LENGTH,
    )?;
    in_range(
        "hashed_password",
        request.hashed_password.chars().count(),
        &ENCODED_HASH_LENGTH,
    )?;

    let blocked = state.lockout.is_blocked(identity.as_str());
    if !blocked.is_allowed() {
        debug!(identity = %identity, "Verification refused, identity locked out");
        return Err(ApiError::LockedOut {
            retry_after_secs: blocked.retry_after_secs,
        });
    }

    // No gate lock is held while the hash runs.
    let hasher = state.hasher.clone();
    let pepper = state.pepper.clone();
    let valid = tokio::task::spawn_blocking(move || {
        hasher.verify(
            request.password.expose_secret(),
            &pepper,
            &request.hashed_password,
        )
    })
    .await?;

    if !valid {
        state.lockout.register_failure(identity.as_str());
        info!(identity = %identity, "Password verification failed");
        return Err(ApiError::Unauthorized);
    }

    state.lockout.reset(identity.as_str());
    Ok(Json(VerifyPasswordResponse { valid: true }))
}

fn in_range(
    field: &str,
    value: usize,
    range: &RangeInclusive<usize>,
) -> Result<usize, ApiError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::Validation(format!(
            "{} must be between {} and {}",
            field,
            range.start(),
            range.end()
        )))
    }
}
