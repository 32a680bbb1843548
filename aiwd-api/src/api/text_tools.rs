//! Auxiliary text tool endpoints
//!
//! Grammar check, plagiarism check, AI-like phrase highlighting and the
//! writing assistant. None of these touch the scoring pipeline.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::services::{
    highlighter, plagiarism_checker, writing_assistant, GrammarReport, HighlightReport,
    ImprovementFocus, ImprovementSuggestion, PlagiarismReport,
};
use crate::AppState;
use aiwd_common::db::records;

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PlagiarismRequest {
    pub content: String,
    /// Accepted for compatibility; web search is not performed
    #[serde(default)]
    pub check_web: bool,
    #[serde(default = "default_true")]
    pub check_internal: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub content: String,
    #[serde(default)]
    pub improvement_focus: Option<ImprovementFocus>,
}

#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub suggestions: Vec<ImprovementSuggestion>,
    pub overall_score: f64,
}

fn default_style() -> String {
    "creative".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub content: String,
    #[serde(default = "default_style")]
    pub style: String,
}

fn require_content(content: &str) -> ApiResult<()> {
    if content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".to_string()));
    }
    Ok(())
}

/// POST /grammar/check
pub async fn check_grammar(
    State(state): State<AppState>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<Json<GrammarReport>> {
    let Json(req) = payload?;
    require_content(&req.content)?;

    let report = state.grammar.check(&req.content).await.map_err(|e| {
        ApiError::Internal(format!("문법검사 API 호출 중 오류 발생: {}", e))
    })?;

    debug!(
        backend = state.grammar.backend_name(),
        total_errors = report.total_errors,
        "Grammar check complete"
    );
    Ok(Json(report))
}

/// POST /plagiarism/check
pub async fn check_plagiarism(
    State(state): State<AppState>,
    payload: Result<Json<PlagiarismRequest>, JsonRejection>,
) -> ApiResult<Json<PlagiarismReport>> {
    let Json(req) = payload?;
    require_content(&req.content)?;

    if req.check_web {
        debug!("Web plagiarism search requested but not available; skipping");
    }

    let matches = if req.check_internal {
        let corpus = records::list_recent(&state.db, state.plagiarism_corpus_limit).await?;
        plagiarism_checker::compare_with_records(&req.content, &corpus)
    } else {
        Vec::new()
    };

    let report = PlagiarismReport::new(&req.content, matches);
    info!(
        overall_similarity = report.overall_similarity,
        matches = report.matched_sources.len(),
        is_plagiarized = report.is_plagiarized,
        "Plagiarism check complete"
    );
    Ok(Json(report))
}

/// POST /highlighting/analyze
pub async fn analyze_highlighting(
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<Json<HighlightReport>> {
    let Json(req) = payload?;
    require_content(&req.content)?;
    Ok(Json(highlighter::analyze(&req.content)))
}

/// POST /assistant/improve
pub async fn improve_writing(
    payload: Result<Json<ImproveRequest>, JsonRejection>,
) -> ApiResult<Json<ImproveResponse>> {
    let Json(req) = payload?;
    require_content(&req.content)?;

    let focus = req.improvement_focus.unwrap_or_default();
    let suggestions = writing_assistant::suggest_improvements(&req.content, focus);
    let score = writing_assistant::creativity_score(&req.content);

    Ok(Json(ImproveResponse {
        suggestions,
        overall_score: (score * 100.0).round() / 100.0,
    }))
}

/// POST /assistant/rewrite?content=...&style=...
///
/// Takes its input from the query string, not a JSON body.
pub async fn rewrite_text(
    params: Result<Query<RewriteRequest>, QueryRejection>,
) -> ApiResult<Json<writing_assistant::RewriteResult>> {
    let Query(req) = params?;
    require_content(&req.content)?;
    Ok(Json(writing_assistant::rewrite(&req.content, &req.style)))
}

/// Build text tool routes
pub fn text_tool_routes() -> Router<AppState> {
    Router::new()
        .route("/grammar/check", post(check_grammar))
        .route("/plagiarism/check", post(check_plagiarism))
        .route("/highlighting/analyze", post(analyze_highlighting))
        .route("/assistant/improve", post(improve_writing))
        .route("/assistant/rewrite", post(rewrite_text))
}
