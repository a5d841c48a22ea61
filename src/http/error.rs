//! Mapping of request outcomes onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::task::JoinError;
use tracing::error;

use crate::error::SafekeysError;

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request was well-formed HTTP but its content is invalid
    Validation(String),
    /// Password verification failed, for whatever reason
    Unauthorized,
    /// The identity exceeded its request budget
    RateLimited { retry_after_secs: u64 },
    /// The identity is locked out after repeated failures
    LockedOut { retry_after_secs: u64 },
    /// Anything the client should not see the details of
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid password or hash.".to_string(),
                None,
            ),
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Try again later.".to_string(),
                Some(retry_after_secs),
            ),
            ApiError::LockedOut { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed attempts. Try again later.".to_string(),
                Some(retry_after_secs),
            ),
            ApiError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorBody {
            success: false,
            error: message,
        });

        match retry_after {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

impl From<SafekeysError> for ApiError {
    fn from(e: SafekeysError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        ApiError::Internal(format!("Blocking task failed: {}", e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            retry_after_secs: 40,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "40");
    }

    #[test]
    fn test_unauthorized_has_no_retry_after() {
        let response = ApiError::Unauthorized.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let response = ApiError::from(SafekeysError::Hash("secret detail".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
