//! HTTP error type for aiwd-api
//!
//! Every error body is `{"detail": ..., "code": ...}` so clients can display
//! `detail` verbatim.

use crate::scoring::AnalysisError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed validation (422)
    #[error("{0}")]
    Validation(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. duplicate text type
    #[error("{0}")]
    Conflict(String),

    /// Analysis pipeline failure (500)
    #[error("분석 중 오류가 발생했습니다: {0}")]
    Analysis(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// aiwd-common error
    #[error("{0}")]
    Common(#[from] aiwd_common::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Analysis(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Analysis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ANALYSIS_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(aiwd_common::Error::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Common(aiwd_common::Error::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Common(aiwd_common::Error::InvalidInput(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        };

        let detail = match &self {
            ApiError::Common(aiwd_common::Error::NotFound(msg))
            | ApiError::Common(aiwd_common::Error::Conflict(msg))
            | ApiError::Common(aiwd_common::Error::InvalidInput(msg)) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!(code, detail = %detail, "Request failed");
        }

        let body = Json(json!({
            "detail": detail,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
