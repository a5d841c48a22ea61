//! Per-identity rate limiting for gated routes.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::state::AppState;

/// Identity used when the peer address is unavailable.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// The caller identity both gates are keyed by: the peer IP address.
///
/// Inserted into request extensions by [`rate_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn from_request(request: &Request) -> Self {
        let identity = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string());
        Self(identity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject the request with `429` once its identity is over budget.
pub async fn rate_limit(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = ClientIdentity::from_request(&request);

    let decision = state.rate_limiter.check(identity.as_str());
    if !decision.is_allowed() {
        return ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs,
        }
        .into_response();
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}
