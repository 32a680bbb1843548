//! # AIWD Common Library
//!
//! Shared code for the AI writing detector service:
//! - Error type used by storage and configuration code
//! - Score weight model and the built-in equal-weight fallback
//! - Bootstrap configuration (TOML + environment + CLI overrides)
//! - SQLite schema and queries (weight configs, analysis records, settings)
//! - Admin API authentication primitives (timestamp + hash)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod weights;

pub use error::{Error, Result};
pub use weights::{ScoreWeights, WeightConfig};
