//! Integration tests for POST /analyze
//!
//! Exercises the full router with deterministic detectors
//! (classifier 0.2, similarity 0.4, perplexity 0.6, burstiness 0.8).

mod helpers;

use axum::{body::Body, http::Request, http::StatusCode};
use helpers::{body_json, json_request, TestAppBuilder, FAULT_MARKER};
use serde_json::json;

use aiwd_common::db::{records, weight_configs};
use aiwd_common::weights::NewWeightConfig;
use aiwd_common::ScoreWeights;

const CONTENT: &str = "인공지능 기술은 다양한 분야에서 활용되고 있으며 앞으로도 계속 발전할 것입니다.";

fn analyze_body(text_type: Option<&str>) -> serde_json::Value {
    let mut body = json!({ "title": "테스트 제목", "content": CONTENT });
    if let Some(text_type) = text_type {
        body["text_type"] = json!(text_type);
    }
    body
}

fn assert_close(actual: &serde_json::Value, expected: f64) {
    let actual = actual.as_f64().expect("number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

async fn add_config(db: &sqlx::SqlitePool, text_type: &str, weights: ScoreWeights, is_default: bool) {
    weight_configs::create_config(
        db,
        &NewWeightConfig {
            text_type: text_type.to_string(),
            description: None,
            weights,
            is_active: true,
            is_default,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_empty_store_uses_equal_weights() {
    let app = TestAppBuilder::default().build().await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(Some("essay"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_close(&body["ai_probability"], 0.5);
    assert_close(&body["analysis_details"]["kobert_score"], 0.2);
    assert_close(&body["analysis_details"]["similarity_score"], 0.4);
    assert_close(&body["analysis_details"]["perplexity_score"], 0.6);
    assert_close(&body["analysis_details"]["burstiness_score"], 0.8);
    assert_eq!(app.provider_calls(), 4);
}

#[tokio::test]
async fn test_text_type_weights_are_applied() {
    let app = TestAppBuilder::default().build().await;
    add_config(&app.db, "essay", ScoreWeights::new(0.25, 0.30, 0.20, 0.25), false).await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(Some("essay"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_close(&body_json(response).await["ai_probability"], 0.49);
}

#[tokio::test]
async fn test_unknown_text_type_falls_back_to_default_config() {
    let app = TestAppBuilder::default().build().await;
    add_config(&app.db, "paper", ScoreWeights::new(1.0, 0.0, 0.0, 0.0), true).await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(Some("poem"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_close(&body_json(response).await["ai_probability"], 0.2);
}

#[tokio::test]
async fn test_text_type_is_case_insensitive() {
    let app = TestAppBuilder::default().build().await;
    add_config(&app.db, "blog", ScoreWeights::new(0.0, 0.0, 0.0, 1.0), false).await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(Some("  BLOG "))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_close(&body_json(response).await["ai_probability"], 0.8);
}

#[tokio::test]
async fn test_successful_analysis_is_persisted() {
    let app = TestAppBuilder::default().build().await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(None)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = records::list_recent(&app.db, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "테스트 제목");
    assert_eq!(stored[0].text_type, "paper");
    assert!((stored[0].ai_probability - 0.5).abs() < 1e-9);
    assert!((stored[0].kobert_score - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_provider_failure_returns_500_without_record() {
    let app = TestAppBuilder::default().build().await;
    let body = json!({
        "title": "실패",
        "content": format!("이 문장은 {} 용도로 작성되었습니다.", FAULT_MARKER),
    });

    let response = app.send(json_request("POST", "/analyze", &body)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("분석 중 오류가 발생했습니다"), "{}", detail);
    assert_eq!(body["code"], "ANALYSIS_FAILED");

    assert_eq!(records::count_records(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sampler_failure_returns_500_without_record() {
    let app = TestAppBuilder::default().failing_sampler().build().await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(Some("essay"))))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("분석 중 오류가 발생했습니다"), "{}", detail);
    assert!(detail.contains("connection refused"), "{}", detail);
    assert_eq!(body["code"], "ANALYSIS_FAILED");

    // The similarity detector needs samples, so it never runs
    assert!(app.provider_calls() < 4);
    assert_eq!(records::count_records(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_short_content_rejected_before_scoring() {
    let app = TestAppBuilder::default().build().await;
    let body = json!({ "title": "짧은 글", "content": "짧은 본문" });

    let response = app.send(json_request("POST", "/analyze", &body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());
    assert_eq!(app.provider_calls(), 0);
    assert_eq!(records::count_records(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_overlong_title_rejected() {
    let app = TestAppBuilder::default().build().await;
    let body = json!({ "title": "가".repeat(201), "content": CONTENT });

    let response = app.send(json_request("POST", "/analyze", &body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.provider_calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_rejected_with_422() {
    let app = TestAppBuilder::default().build().await;
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\": \"x\", "))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_missing_content_field_rejected_with_422() {
    let app = TestAppBuilder::default().build().await;

    let response = app
        .send(json_request("POST", "/analyze", &json!({ "title": "제목" })))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_persistence_failure_still_returns_result() {
    let app = TestAppBuilder::default().failing_result_store().build().await;

    let response = app
        .send(json_request("POST", "/analyze", &analyze_body(None)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_close(&body_json(response).await["ai_probability"], 0.5);
}

#[tokio::test]
async fn test_versioned_mount_serves_same_endpoint() {
    let app = TestAppBuilder::default().build().await;

    let response = app
        .send(json_request("POST", "/api/v1/analyze", &analyze_body(None)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_close(&body_json(response).await["ai_probability"], 0.5);
}
