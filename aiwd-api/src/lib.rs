//! aiwd-api library interface
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod sampler;
pub mod scoring;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use services::GrammarChecker;
use scoring::ScoringOrchestrator;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Default number of stored analyses the plagiarism check compares against
pub const DEFAULT_PLAGIARISM_CORPUS_LIMIT: i64 = 200;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Scoring pipeline
    pub orchestrator: Arc<ScoringOrchestrator>,
    /// Grammar backend (built-in rules or remote API)
    pub grammar: Arc<GrammarChecker>,
    /// Shared secret for admin authentication; 0 disables authentication
    pub shared_secret: i64,
    /// Maximum accepted age of an admin request timestamp
    pub auth_max_age_ms: i64,
    /// How many recent analyses the plagiarism check scans
    pub plagiarism_corpus_limit: i64,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, orchestrator: Arc<ScoringOrchestrator>, shared_secret: i64) -> Self {
        Self {
            db,
            orchestrator,
            grammar: Arc::new(GrammarChecker::Builtin),
            shared_secret,
            auth_max_age_ms: 30_000,
            plagiarism_corpus_limit: DEFAULT_PLAGIARISM_CORPUS_LIMIT,
            startup_time: Utc::now(),
        }
    }

    pub fn with_grammar_checker(mut self, grammar: GrammarChecker) -> Self {
        self.grammar = Arc::new(grammar);
        self
    }

    pub fn with_auth_max_age_ms(mut self, max_age_ms: i64) -> Self {
        self.auth_max_age_ms = max_age_ms;
        self
    }

    pub fn with_plagiarism_corpus_limit(mut self, limit: i64) -> Self {
        self.plagiarism_corpus_limit = limit;
        self
    }
}

/// Build application router
///
/// Public service routes are mounted both at the root and under `/api/v1`.
/// Admin routes require timestamp/hash authentication. `/health` is never
/// authenticated.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require authentication)
    let admin = api::admin_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    let service = Router::new()
        .merge(api::analysis_routes())
        .merge(api::text_tool_routes())
        .merge(admin);

    Router::new()
        .merge(service.clone())
        .nest("/api/v1", service)
        .merge(api::health_routes())
        .with_state(state)
}
