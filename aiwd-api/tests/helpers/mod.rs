//! Shared fixtures for aiwd-api integration tests
//!
//! Builds the full router over an in-memory database with deterministic
//! detectors, so tests can assert exact probabilities.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aiwd_api::sampler::{GenerativeSampler, OfflineSampler, SamplerError};
use aiwd_api::scoring::{
    OrchestratorSettings, ProviderError, ResultStore, ScoreKind, ScoreProvider, ScoreProviders,
    ScoringOrchestrator, SqliteResultStore, SqliteWeightStore,
};
use aiwd_api::{build_router, AppState};
use aiwd_common::api::auth::{calculate_hash, signing_document};
use aiwd_common::db::{connect_in_memory, NewAnalysisRecord};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;

/// Content containing this marker makes every test detector fail
pub const FAULT_MARKER: &str = "에러 테스트";

/// Shared secret used when a test enables admin authentication
pub const TEST_SECRET: i64 = 987_654_321;

/// Detector returning a fixed score and counting invocations
pub struct FixedScorer {
    kind: ScoreKind,
    score: f64,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ScoreProvider for FixedScorer {
    fn kind(&self) -> ScoreKind {
        self.kind
    }

    async fn score(&self, content: &str, _context: &[String]) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.contains(FAULT_MARKER) {
            return Err(ProviderError::internal(self.kind, "injected failure"));
        }
        Ok(self.score)
    }
}

/// Result store that always fails
pub struct FailingResultStore;

#[async_trait]
impl ResultStore for FailingResultStore {
    async fn save(&self, _record: &NewAnalysisRecord) -> aiwd_common::Result<i64> {
        Err(aiwd_common::Error::Internal("disk full".to_string()))
    }
}

/// Sampler that fails as an unreachable upstream would
pub struct FailingSampler;

#[async_trait]
impl GenerativeSampler for FailingSampler {
    async fn generate(&self, _content: &str, _count: usize) -> Result<Vec<String>, SamplerError> {
        Err(SamplerError::Request("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    /// Total detector invocations across all four detectors
    pub calls: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn provider_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Send one request through a clone of the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub struct TestAppBuilder {
    scores: [f64; 4],
    shared_secret: i64,
    failing_result_store: bool,
    failing_sampler: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            scores: [0.2, 0.4, 0.6, 0.8],
            shared_secret: 0,
            failing_result_store: false,
            failing_sampler: false,
        }
    }
}

impl TestAppBuilder {
    /// Scores in classifier, similarity, perplexity, burstiness order
    pub fn scores(mut self, scores: [f64; 4]) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_auth(mut self) -> Self {
        self.shared_secret = TEST_SECRET;
        self
    }

    pub fn failing_result_store(mut self) -> Self {
        self.failing_result_store = true;
        self
    }

    pub fn failing_sampler(mut self) -> Self {
        self.failing_sampler = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let db = connect_in_memory().await.expect("in-memory database");
        let calls = Arc::new(AtomicUsize::new(0));

        let scorer = |kind: ScoreKind, score: f64| -> Arc<dyn ScoreProvider> {
            Arc::new(FixedScorer {
                kind,
                score,
                calls: calls.clone(),
            })
        };
        let providers = ScoreProviders {
            classifier: scorer(ScoreKind::Classifier, self.scores[0]),
            similarity: scorer(ScoreKind::Similarity, self.scores[1]),
            perplexity: scorer(ScoreKind::Perplexity, self.scores[2]),
            burstiness: scorer(ScoreKind::Burstiness, self.scores[3]),
        };

        let result_store: Arc<dyn ResultStore> = if self.failing_result_store {
            Arc::new(FailingResultStore)
        } else {
            Arc::new(SqliteResultStore::new(db.clone()))
        };

        let sampler: Arc<dyn GenerativeSampler> = if self.failing_sampler {
            Arc::new(FailingSampler)
        } else {
            Arc::new(OfflineSampler::new())
        };

        let orchestrator = ScoringOrchestrator::new(
            providers,
            sampler,
            Arc::new(SqliteWeightStore::new(db.clone())),
            result_store,
            OrchestratorSettings::default(),
        );

        let state = AppState::new(db.clone(), Arc::new(orchestrator), self.shared_secret);

        TestApp {
            router: build_router(state),
            db,
            calls,
        }
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn target_of(uri: &str) -> String {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };
    aiwd_common::api::auth::signed_target(path, query)
}

/// Add `timestamp` and a valid `hash` to a JSON body sent as `method uri`
pub fn sign_body(method: &str, uri: &str, mut body: Value, secret: i64) -> Value {
    let timestamp = now_millis();
    body["timestamp"] = Value::from(timestamp);
    let document = signing_document(method, &target_of(uri), timestamp, Some(&body));
    body["hash"] = Value::from(calculate_hash(&document, secret));
    body
}

/// Append `timestamp` and a valid `hash` query parameters to `uri` for a
/// bodyless `method` request
pub fn sign_query(method: &str, uri: &str, secret: i64) -> String {
    let timestamp = now_millis();
    let document = signing_document(method, &target_of(uri), timestamp, None);
    let hash = calculate_hash(&document, secret);
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}timestamp={}&hash={}", uri, separator, timestamp, hash)
}
