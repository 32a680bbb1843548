//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Authentication parameters for bodyless requests (query parameters)
///
/// ```
/// // GET /admin/analysis-configs?timestamp=1730000000000&hash=abc123...
/// use aiwd_common::api::types::AuthQuery;
///
/// let query = AuthQuery {
///     timestamp: 1730000000000,
///     hash: "abc123...".to_string(),
/// };
/// assert_eq!(query.timestamp, 1730000000000);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Error body returned as 401/400 when admin authentication fails
#[derive(Debug, Clone, Serialize)]
pub struct AuthErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message (also exposed as `detail`)
    pub detail: String,
}

impl AuthErrorResponse {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: detail.into(),
        }
    }
}
