//! Database initialization
//!
//! Tables are created idempotently on every startup.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if missing) the database file and ensure the schema exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// One connection only: every `:memory:` connection is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_analysis_config_table(pool).await?;
    create_analysis_records_table(pool).await?;

    tracing::info!("Database tables initialized (settings, analysis_config, analysis_records)");
    Ok(())
}

pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_analysis_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_config (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text_type TEXT NOT NULL UNIQUE,
            description TEXT,
            kobert_weight REAL NOT NULL CHECK (kobert_weight >= 0.0),
            sbert_weight REAL NOT NULL CHECK (sbert_weight >= 0.0),
            perplexity_weight REAL NOT NULL CHECK (perplexity_weight >= 0.0),
            burstiness_weight REAL NOT NULL CHECK (burstiness_weight >= 0.0),
            is_active INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one default row
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_analysis_config_single_default
        ON analysis_config (is_default) WHERE is_default = 1
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_analysis_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            text_type TEXT NOT NULL,
            ai_probability REAL NOT NULL,
            kobert_score REAL NOT NULL,
            similarity_score REAL NOT NULL,
            perplexity_score REAL NOT NULL,
            burstiness_score REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
