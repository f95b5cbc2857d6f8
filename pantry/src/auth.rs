use crate::api::ApiError;
use axum::http::{HeaderMap, header};

/// Checks the caller's bearer token before any handler logic runs.
///
/// A missing or unreadable header is unauthenticated (401); a readable
/// token that does not match is unauthorized (403).
pub fn require_bearer(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthenticated)?
        .to_str()
        .map_err(|_| ApiError::Unauthenticated)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    if token != expected {
        return Err(ApiError::Forbidden);
    }

    Ok(())
}
