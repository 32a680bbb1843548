//! Admin endpoints: weight configuration management and analysis history
//!
//! All routes here sit behind [`super::auth_middleware`]. JSON field names
//! follow the stored column names (`kobert_weight`, `sbert_weight`, ...).

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::scoring::orchestrator::normalize_text_type;
use crate::AppState;
use aiwd_common::db::{records, weight_configs, AnalysisRecord};
use aiwd_common::weights::{NewWeightConfig, WeightConfigPatch};
use aiwd_common::{ScoreWeights, WeightConfig};

const DEFAULT_RECORDS_LIMIT: i64 = 50;
const MAX_RECORDS_LIMIT: i64 = 500;

fn default_true() -> bool {
    true
}

fn default_kobert_weight() -> f64 {
    0.35
}

fn default_sbert_weight() -> f64 {
    0.25
}

fn default_perplexity_weight() -> f64 {
    0.20
}

fn default_burstiness_weight() -> f64 {
    0.20
}

#[derive(Debug, Deserialize)]
pub struct CreateConfigRequest {
    pub text_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_kobert_weight")]
    pub kobert_weight: f64,
    #[serde(default = "default_sbert_weight")]
    pub sbert_weight: f64,
    #[serde(default = "default_perplexity_weight")]
    pub perplexity_weight: f64,
    #[serde(default = "default_burstiness_weight")]
    pub burstiness_weight: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateConfigRequest {
    pub description: Option<String>,
    pub kobert_weight: Option<f64>,
    pub sbert_weight: Option<f64>,
    pub perplexity_weight: Option<f64>,
    pub burstiness_weight: Option<f64>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
}

impl From<UpdateConfigRequest> for WeightConfigPatch {
    fn from(req: UpdateConfigRequest) -> Self {
        WeightConfigPatch {
            description: req.description,
            classifier: req.kobert_weight,
            similarity: req.sbert_weight,
            perplexity: req.perplexity_weight,
            burstiness: req.burstiness_weight,
            is_active: req.is_active,
            is_default: req.is_default,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub id: i64,
    pub text_type: String,
    pub description: Option<String>,
    pub kobert_weight: f64,
    pub sbert_weight: f64,
    pub perplexity_weight: f64,
    pub burstiness_weight: f64,
    pub is_active: bool,
    pub is_default: bool,
    /// Informational; 1.0 is recommended but not enforced
    pub weight_sum: f64,
}

impl From<WeightConfig> for ConfigResponse {
    fn from(config: WeightConfig) -> Self {
        Self {
            id: config.id,
            weight_sum: config.weights.sum(),
            text_type: config.text_type,
            description: config.description,
            kobert_weight: config.weights.classifier,
            sbert_weight: config.weights.similarity,
            perplexity_weight: config.weights.perplexity,
            burstiness_weight: config.weights.burstiness,
            is_active: config.is_active,
            is_default: config.is_default,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<i64>,
}

fn not_found(text_type: &str) -> ApiError {
    ApiError::NotFound(format!(
        "No analysis configuration for text type '{}'",
        text_type
    ))
}

/// GET /admin/analysis-configs
pub async fn list_configs(State(state): State<AppState>) -> ApiResult<Json<Vec<ConfigResponse>>> {
    let configs = weight_configs::list_configs(&state.db).await?;
    Ok(Json(configs.into_iter().map(ConfigResponse::from).collect()))
}

/// GET /admin/analysis-configs/:text_type
pub async fn get_config(
    State(state): State<AppState>,
    Path(text_type): Path<String>,
) -> ApiResult<Json<ConfigResponse>> {
    let key = normalize_text_type(&text_type).ok_or_else(|| not_found(&text_type))?;
    let config = weight_configs::get_config(&state.db, &key)
        .await?
        .ok_or_else(|| not_found(&key))?;
    Ok(Json(config.into()))
}

/// POST /admin/analysis-configs
pub async fn create_config(
    State(state): State<AppState>,
    payload: Result<Json<CreateConfigRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ConfigResponse>)> {
    let Json(req) = payload?;

    let text_type = normalize_text_type(&req.text_type)
        .ok_or_else(|| ApiError::Validation("text_type must not be blank".to_string()))?;

    let weights = ScoreWeights::new(
        req.kobert_weight,
        req.sbert_weight,
        req.perplexity_weight,
        req.burstiness_weight,
    );
    weights.validate_range().map_err(ApiError::Validation)?;
    weights.warn_if_unnormalized(&text_type);

    let created = weight_configs::create_config(
        &state.db,
        &NewWeightConfig {
            text_type,
            description: req.description,
            weights,
            is_active: req.is_active,
            is_default: req.is_default,
        },
    )
    .await?;

    info!(text_type = %created.text_type, is_default = created.is_default, "Weight config created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// PUT /admin/analysis-configs/:text_type
pub async fn update_config(
    State(state): State<AppState>,
    Path(text_type): Path<String>,
    payload: Result<Json<UpdateConfigRequest>, JsonRejection>,
) -> ApiResult<Json<ConfigResponse>> {
    let Json(req) = payload?;
    let key = normalize_text_type(&text_type).ok_or_else(|| not_found(&text_type))?;
    let patch = WeightConfigPatch::from(req);

    // Range-check the merged result before writing
    let current = weight_configs::get_config(&state.db, &key)
        .await?
        .ok_or_else(|| not_found(&key))?;
    patch
        .apply_to(&current)
        .weights
        .validate_range()
        .map_err(ApiError::Validation)?;

    let updated = weight_configs::update_config(&state.db, &key, &patch)
        .await?
        .ok_or_else(|| not_found(&key))?;
    updated.weights.warn_if_unnormalized(&key);

    info!(text_type = %key, "Weight config updated");
    Ok(Json(updated.into()))
}

/// DELETE /admin/analysis-configs/:text_type
pub async fn delete_config(
    State(state): State<AppState>,
    Path(text_type): Path<String>,
) -> ApiResult<StatusCode> {
    let key = normalize_text_type(&text_type).ok_or_else(|| not_found(&text_type))?;

    if !weight_configs::delete_config(&state.db, &key).await? {
        return Err(not_found(&key));
    }

    info!(text_type = %key, "Weight config deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/analysis-configs/init-defaults
pub async fn init_defaults(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = weight_configs::seed_presets(&state.db).await?;
    let names: Vec<String> = created.into_iter().map(|c| c.text_type).collect();

    info!(created = ?names, "Preset weight configs seeded");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} preset configuration(s) created", names.len()),
            "created": names,
        })),
    ))
}

/// GET /admin/analysis-records?limit=N
pub async fn list_records(
    State(state): State<AppState>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AnalysisRecord>>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECORDS_LIMIT)
        .clamp(1, MAX_RECORDS_LIMIT);

    Ok(Json(records::list_recent(&state.db, limit).await?))
}

/// Build admin routes (authentication is layered on by the caller)
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/analysis-configs",
            get(list_configs).post(create_config),
        )
        .route(
            "/admin/analysis-configs/init-defaults",
            post(init_defaults),
        )
        .route(
            "/admin/analysis-configs/:text_type",
            get(get_config).put(update_config).delete(delete_config),
        )
        .route("/admin/analysis-records", get(list_records))
}
