//! Weight configuration queries (`analysis_config` table)
//!
//! Default uniqueness: a partial unique index allows only one row with
//! `is_default = 1`. Writes that mark a row as default first clear the flag on
//! every other row inside the same transaction, so switching the default never
//! trips the index.

use crate::weights::{
    preset_configs, NewWeightConfig, ScoreWeights, WeightConfig, WeightConfigPatch,
};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SELECT_COLUMNS: &str = "SELECT id, text_type, description, kobert_weight, sbert_weight, \
     perplexity_weight, burstiness_weight, is_active, is_default FROM analysis_config";

fn config_from_row(row: &SqliteRow) -> std::result::Result<WeightConfig, sqlx::Error> {
    Ok(WeightConfig {
        id: row.try_get("id")?,
        text_type: row.try_get("text_type")?,
        description: row.try_get("description")?,
        weights: ScoreWeights {
            classifier: row.try_get("kobert_weight")?,
            similarity: row.try_get("sbert_weight")?,
            perplexity: row.try_get("perplexity_weight")?,
            burstiness: row.try_get("burstiness_weight")?,
        },
        is_active: row.try_get("is_active")?,
        is_default: row.try_get("is_default")?,
    })
}

/// All configurations ordered by text type
pub async fn list_configs(db: &SqlitePool) -> Result<Vec<WeightConfig>> {
    let rows = sqlx::query(&format!("{} ORDER BY text_type", SELECT_COLUMNS))
        .fetch_all(db)
        .await?;

    rows.iter()
        .map(|row| config_from_row(row).map_err(Error::Database))
        .collect()
}

/// Configuration for a text type regardless of its active flag
pub async fn get_config(db: &SqlitePool, text_type: &str) -> Result<Option<WeightConfig>> {
    let row = sqlx::query(&format!("{} WHERE text_type = ?", SELECT_COLUMNS))
        .bind(text_type)
        .fetch_optional(db)
        .await?;

    Ok(row.as_ref().map(config_from_row).transpose()?)
}

/// Active configuration for a text type
pub async fn get_active_config(db: &SqlitePool, text_type: &str) -> Result<Option<WeightConfig>> {
    let row = sqlx::query(&format!(
        "{} WHERE text_type = ? AND is_active = 1",
        SELECT_COLUMNS
    ))
    .bind(text_type)
    .fetch_optional(db)
    .await?;

    Ok(row.as_ref().map(config_from_row).transpose()?)
}

/// The configuration flagged default and active
pub async fn get_default_config(db: &SqlitePool) -> Result<Option<WeightConfig>> {
    let row = sqlx::query(&format!(
        "{} WHERE is_default = 1 AND is_active = 1 ORDER BY id LIMIT 1",
        SELECT_COLUMNS
    ))
    .fetch_optional(db)
    .await?;

    Ok(row.as_ref().map(config_from_row).transpose()?)
}

/// Insert a configuration
///
/// Returns `Error::Conflict` when the text type already exists.
pub async fn create_config(db: &SqlitePool, config: &NewWeightConfig) -> Result<WeightConfig> {
    let mut tx = db.begin().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM analysis_config WHERE text_type = ?")
        .bind(&config.text_type)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(format!(
            "Configuration for text type '{}' already exists",
            config.text_type
        )));
    }

    if config.is_default {
        sqlx::query("UPDATE analysis_config SET is_default = 0 WHERE is_default = 1")
            .execute(&mut *tx)
            .await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO analysis_config (
            text_type, description, kobert_weight, sbert_weight,
            perplexity_weight, burstiness_weight, is_active, is_default
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&config.text_type)
    .bind(&config.description)
    .bind(config.weights.classifier)
    .bind(config.weights.similarity)
    .bind(config.weights.perplexity)
    .bind(config.weights.burstiness)
    .bind(config.is_active)
    .bind(config.is_default)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(WeightConfig {
        id: result.last_insert_rowid(),
        text_type: config.text_type.clone(),
        description: config.description.clone(),
        weights: config.weights,
        is_active: config.is_active,
        is_default: config.is_default,
    })
}

/// Apply a partial update; `Ok(None)` when the text type does not exist
pub async fn update_config(
    db: &SqlitePool,
    text_type: &str,
    patch: &WeightConfigPatch,
) -> Result<Option<WeightConfig>> {
    let mut tx = db.begin().await?;

    let row = sqlx::query(&format!("{} WHERE text_type = ?", SELECT_COLUMNS))
        .bind(text_type)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(current) = row.as_ref().map(config_from_row).transpose()? else {
        return Ok(None);
    };

    let updated = patch.apply_to(&current);

    if updated.is_default && !current.is_default {
        sqlx::query("UPDATE analysis_config SET is_default = 0 WHERE is_default = 1 AND id != ?")
            .bind(current.id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        UPDATE analysis_config SET
            description = ?, kobert_weight = ?, sbert_weight = ?,
            perplexity_weight = ?, burstiness_weight = ?, is_active = ?, is_default = ?
        WHERE id = ?
        "#,
    )
    .bind(&updated.description)
    .bind(updated.weights.classifier)
    .bind(updated.weights.similarity)
    .bind(updated.weights.perplexity)
    .bind(updated.weights.burstiness)
    .bind(updated.is_active)
    .bind(updated.is_default)
    .bind(updated.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(updated))
}

/// Delete a configuration; `false` when it did not exist
pub async fn delete_config(db: &SqlitePool, text_type: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM analysis_config WHERE text_type = ?")
        .bind(text_type)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Seed the paper/essay/blog presets, skipping text types that already exist
///
/// Returns only the configurations created by this call.
pub async fn seed_presets(db: &SqlitePool) -> Result<Vec<WeightConfig>> {
    let mut created = Vec::new();

    for preset in preset_configs() {
        if get_config(db, &preset.text_type).await?.is_some() {
            tracing::debug!(text_type = %preset.text_type, "Preset already present, skipping");
            continue;
        }
        created.push(create_config(db, &preset).await?);
    }

    Ok(created)
}
