//! Analysis history (`analysis_records` table)
//!
//! Rows are append-only: a completed analysis is stored once and never
//! updated.

use crate::weights::SubScores;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Completed analysis to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisRecord {
    pub title: String,
    pub content: String,
    pub text_type: String,
    pub ai_probability: f64,
    pub scores: SubScores,
    pub created_at: DateTime<Utc>,
}

/// Stored analysis row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub text_type: String,
    pub ai_probability: f64,
    pub kobert_score: f64,
    pub similarity_score: f64,
    pub perplexity_score: f64,
    pub burstiness_score: f64,
    pub created_at: DateTime<Utc>,
}

fn record_from_row(row: &SqliteRow) -> std::result::Result<AnalysisRecord, sqlx::Error> {
    Ok(AnalysisRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        text_type: row.try_get("text_type")?,
        ai_probability: row.try_get("ai_probability")?,
        kobert_score: row.try_get("kobert_score")?,
        similarity_score: row.try_get("similarity_score")?,
        perplexity_score: row.try_get("perplexity_score")?,
        burstiness_score: row.try_get("burstiness_score")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a record, returning its id
pub async fn insert_record(db: &SqlitePool, record: &NewAnalysisRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO analysis_records (
            title, content, text_type, ai_probability, kobert_score,
            similarity_score, perplexity_score, burstiness_score, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.title)
    .bind(&record.content)
    .bind(&record.text_type)
    .bind(record.ai_probability)
    .bind(record.scores.classifier)
    .bind(record.scores.similarity)
    .bind(record.scores.perplexity)
    .bind(record.scores.burstiness)
    .bind(record.created_at)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent records first
pub async fn list_recent(db: &SqlitePool, limit: i64) -> Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, text_type, ai_probability, kobert_score,
               similarity_score, perplexity_score, burstiness_score, created_at
        FROM analysis_records
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    rows.iter()
        .map(|row| record_from_row(row).map_err(Error::Database))
        .collect()
}

pub async fn count_records(db: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analysis_records")
        .fetch_one(db)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn sample(title: &str) -> NewAnalysisRecord {
        NewAnalysisRecord {
            title: title.to_string(),
            content: "인공지능 기술은 빠르게 발전하고 있습니다.".to_string(),
            text_type: "paper".to_string(),
            ai_probability: 0.49,
            scores: SubScores {
                classifier: 0.2,
                similarity: 0.4,
                perplexity: 0.6,
                burstiness: 0.8,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_recent() {
        let pool = connect_in_memory().await.unwrap();

        insert_record(&pool, &sample("first")).await.unwrap();
        let second_id = insert_record(&pool, &sample("second")).await.unwrap();

        let records = list_recent(&pool, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second_id);
        assert_eq!(records[0].title, "second");
        assert_eq!(records[0].similarity_score, 0.4);
        assert_eq!(records[0].burstiness_score, 0.8);

        assert_eq!(list_recent(&pool, 1).await.unwrap().len(), 1);
        assert_eq!(count_records(&pool).await.unwrap(), 2);
    }
}
