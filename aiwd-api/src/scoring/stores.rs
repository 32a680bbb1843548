//! Storage seams used by the orchestrator
//!
//! Both traits have SQLite implementations backed by the shared pool; tests
//! substitute failing or in-memory doubles.

use aiwd_common::db::{records, weight_configs, NewAnalysisRecord};
use aiwd_common::{Result, WeightConfig};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Source of per-text-type weight configurations
#[async_trait]
pub trait WeightConfigStore: Send + Sync {
    /// Active configuration for `text_type`, if any
    async fn get_active_config(&self, text_type: &str) -> Result<Option<WeightConfig>>;

    /// Configuration flagged as default (and active), if any
    async fn get_default_config(&self) -> Result<Option<WeightConfig>>;
}

/// Sink for completed analyses
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a completed analysis, returning the stored row id
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64>;
}

#[derive(Clone)]
pub struct SqliteWeightStore {
    db: SqlitePool,
}

impl SqliteWeightStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WeightConfigStore for SqliteWeightStore {
    async fn get_active_config(&self, text_type: &str) -> Result<Option<WeightConfig>> {
        weight_configs::get_active_config(&self.db, text_type).await
    }

    async fn get_default_config(&self) -> Result<Option<WeightConfig>> {
        weight_configs::get_default_config(&self.db).await
    }
}

#[derive(Clone)]
pub struct SqliteResultStore {
    db: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64> {
        records::insert_record(&self.db, record).await
    }
}
