//! AI-likelihood analysis endpoint
//!
//! POST /analyze: score a text with the four detectors and return the
//! weighted probability plus the individual scores.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::scoring::AnalysisRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub text_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisDetails {
    pub kobert_score: f64,
    pub similarity_score: f64,
    pub perplexity_score: f64,
    pub burstiness_score: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ai_probability: f64,
    pub analysis_details: AnalysisDetails,
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Json(request) = payload?;

    info!(
        title_chars = request.title.chars().count(),
        content_chars = request.content.chars().count(),
        text_type = ?request.text_type,
        "Analysis requested"
    );

    let outcome = state
        .orchestrator
        .analyze(AnalysisRequest {
            title: request.title,
            content: request.content,
            text_type: request.text_type,
        })
        .await?;

    Ok(Json(AnalyzeResponse {
        ai_probability: outcome.ai_probability,
        analysis_details: AnalysisDetails {
            kobert_score: outcome.scores.classifier,
            similarity_score: outcome.scores.similarity,
            perplexity_score: outcome.scores.perplexity,
            burstiness_score: outcome.scores.burstiness,
        },
    }))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}
