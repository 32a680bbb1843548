//! Authentication middleware for admin routes
//!
//! Requests with a JSON body carry `timestamp` and `hash` inside the body;
//! bodyless requests (GET, DELETE, seed) carry them as query parameters.
//! Either way the hash covers the method, the original request target
//! (including the `/api/v1` prefix when present) and the body, so a captured
//! signature only authorizes the exact request it was made for.

use aiwd_common::api::auth::{
    signed_target, signing_document, validate_hash, validate_timestamp, ApiAuthError,
};
use aiwd_common::api::types::{AuthErrorResponse, AuthQuery};
use axum::{
    body::Body,
    extract::{OriginalUri, Query, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::AppState;

/// Request bodies above this size are rejected before hashing
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Authentication middleware
///
/// A shared secret of 0 disables checking entirely.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let (auth, body_value) = if body_bytes.is_empty() {
        (auth_from_query(&parts.uri)?, None)
    } else {
        let value: Value = serde_json::from_slice(&body_bytes)
            .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;
        let auth: AuthQuery = serde_json::from_value(value.clone())
            .map_err(|e| AuthError::MissingFields(e.to_string()))?;
        (auth, Some(value))
    };

    validate_timestamp(auth.timestamp, state.auth_max_age_ms).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        other => AuthError::Other(other.to_string()),
    })?;

    // Nested routers see a stripped URI; sign against what the client sent
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let target = signed_target(uri.path(), uri.query());
    let document = signing_document(
        parts.method.as_str(),
        &target,
        auth.timestamp,
        body_value.as_ref(),
    );

    validate_hash(&auth.hash, &document, state.shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash {
            provided,
            calculated,
        } => {
            warn!(
                method = %parts.method,
                target = %target,
                "Hash validation failed: provided={}, calculated={}",
                provided,
                calculated
            );
            AuthError::InvalidHash
        }
        other => AuthError::Other(other.to_string()),
    })?;

    // Restore the body for the handler
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

/// Parse `timestamp` and `hash` out of the query string
fn auth_from_query(uri: &Uri) -> Result<AuthQuery, AuthError> {
    Query::<AuthQuery>::try_from_uri(uri)
        .map(|Query(auth)| auth)
        .map_err(|e| AuthError::MissingFields(e.body_text()))
}

/// Authentication failures
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "timestamp_invalid",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => (
                StatusCode::UNAUTHORIZED,
                "hash_invalid",
                "Invalid hash".to_string(),
            ),
            AuthError::MissingFields(msg) => (
                StatusCode::BAD_REQUEST,
                "auth_fields_missing",
                format!("Missing required fields: {}", msg),
            ),
            AuthError::ParseError(msg) => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("Parse error: {}", msg),
            ),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_error",
                format!("Authentication error: {}", msg),
            ),
        };

        (status, Json(AuthErrorResponse::new(error, detail))).into_response()
    }
}
