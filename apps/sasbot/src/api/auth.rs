//! # Authentication Module
//!
//! Shared-secret authentication for calls from the workflow engine.
//!
//! ## Configuration
//!
//! - `SASBOT_API_KEY`: if set, every request except `/health` needs it
//!
//! ## Usage
//!
//! Send the key in either header:
//! ```text
//! x-api-key: <your-api-key>
//! Authorization: Bearer <your-api-key>
//! ```

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

/// Header the workflow engine's HTTP nodes send the key in.
pub const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Returns `Some(key)` if `SASBOT_API_KEY` is set and non-empty, `None`
/// otherwise (authentication disabled).
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("SASBOT_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// The key a request carries: `x-api-key` first, then `Authorization` with
/// or without the `Bearer ` prefix.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
}

/// Constant-time key comparison.
///
/// Both sides are padded to the same length so `ct_eq` always runs over the
/// same number of bytes.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(StatusCode::UNAUTHORIZED, "Invalid API key")),
    )
        .into_response()
}

/// API key authentication middleware.
///
/// `/health` is always allowed (load balancer checks). Without
/// `SASBOT_API_KEY` every request is allowed.
pub async fn api_key_auth_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(expected) = get_api_key_from_env() else {
        return next.run(request).await;
    };

    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let verdict = provided_key(request.headers()).map(|key| keys_match(key, &expected));
    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                path = %request.uri().path(),
                "Authentication failed: invalid API key"
            );
            unauthorized()
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_api_key",
                path = %request.uri().path(),
                "Missing API key"
            );
            unauthorized()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
