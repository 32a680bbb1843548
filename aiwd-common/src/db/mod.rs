//! SQLite access layer
//!
//! Tables:
//! - `settings`: key/value runtime settings (shared secret, API keys)
//! - `analysis_config`: per-text-type weight configurations
//! - `analysis_records`: immutable history of completed analyses

pub mod init;
pub mod records;
pub mod settings;
pub mod weight_configs;

pub use init::{connect_in_memory, init_database_pool, init_tables};
pub use records::{AnalysisRecord, NewAnalysisRecord};
