//! Shared admin API authentication and types
//!
//! Contains only pure functions, database operations and serde types; the
//! axum middleware that applies them lives in `aiwd-api`.

pub mod auth;
pub mod types;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, signed_target,
    signing_document, validate_hash, validate_timestamp, ApiAuthError,
};
pub use types::{AuthErrorResponse, AuthQuery};
