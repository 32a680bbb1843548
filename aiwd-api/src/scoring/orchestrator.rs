//! Scoring orchestration
//!
//! `analyze` runs one request end to end:
//!
//! 1. Validate the request (nothing runs for invalid input)
//! 2. Resolve the text type and its weights
//!    (active type config → default config → [`ScoreWeights::EQUAL`])
//! 3. Fan out: sampler → similarity, classifier, perplexity, burstiness
//! 4. Fan in with `try_join!`: the first failure drops the other legs
//! 5. Weighted sum (unclamped)
//! 6. Persist best-effort; storage failures never change the response

use super::stores::{ResultStore, WeightConfigStore};
use super::{ProviderError, ScoreProvider, ScoreProviders};
use crate::sampler::{GenerativeSampler, SamplerError};
use aiwd_common::config::AnalysisConfig;
use aiwd_common::db::NewAnalysisRecord;
use aiwd_common::weights::SubScores;
use aiwd_common::ScoreWeights;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// One analysis submission
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub title: String,
    pub content: String,
    /// Blank or absent selects the configured default text type
    pub text_type: Option<String>,
}

impl AnalysisRequest {
    /// Length limits are counted in characters, not bytes
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let title_chars = self.title.chars().count();
        if title_chars > MAX_TITLE_CHARS {
            return Err(AnalysisError::Validation(format!(
                "title must be at most {} characters (got {})",
                MAX_TITLE_CHARS, title_chars
            )));
        }

        let content_chars = self.content.chars().count();
        if !(MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&content_chars) {
            return Err(AnalysisError::Validation(format!(
                "content must be between {} and {} characters (got {})",
                MIN_CONTENT_CHARS, MAX_CONTENT_CHARS, content_chars
            )));
        }

        Ok(())
    }
}

/// Which fallback tier supplied the weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Active configuration for the requested text type
    TextType,
    /// Configuration flagged as default
    Default,
    /// [`ScoreWeights::EQUAL`]
    Builtin,
}

/// Completed analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub ai_probability: f64,
    pub scores: SubScores,
    pub text_type: String,
    pub weights: ScoreWeights,
    pub weight_source: WeightSource,
    /// Stored record id; `None` when persistence failed
    pub record_id: Option<i64>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

/// Runtime knobs taken from the `[analysis]` config section
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub default_text_type: String,
    pub sample_count: usize,
    pub provider_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for OrchestratorSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            default_text_type: normalize_text_type(&config.default_text_type)
                .unwrap_or_else(|| "paper".to_string()),
            sample_count: config.sample_count,
            provider_timeout: Duration::from_millis(config.provider_timeout_ms),
        }
    }
}

/// Trimmed, lowercased text type; `None` when blank
pub fn normalize_text_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

pub struct ScoringOrchestrator {
    providers: ScoreProviders,
    sampler: Arc<dyn GenerativeSampler>,
    weight_store: Arc<dyn WeightConfigStore>,
    result_store: Arc<dyn ResultStore>,
    settings: OrchestratorSettings,
}

impl ScoringOrchestrator {
    pub fn new(
        providers: ScoreProviders,
        sampler: Arc<dyn GenerativeSampler>,
        weight_store: Arc<dyn WeightConfigStore>,
        result_store: Arc<dyn ResultStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            providers,
            sampler,
            weight_store,
            result_store,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        request.validate()?;

        let started = Instant::now();
        let text_type = self.resolve_text_type(request.text_type.as_deref());
        let (weights, weight_source) = self.resolve_weights(&text_type).await;
        weights.warn_if_unnormalized(&text_type);

        let content = request.content.as_str();

        let similarity_leg = async {
            let samples = self
                .sampler
                .generate(content, self.settings.sample_count)
                .await
                .map_err(|e| {
                    error!(sampler = self.sampler.name(), error = %e, "Sample generation failed");
                    AnalysisError::from(e)
                })?;
            self.run_provider(self.providers.similarity.as_ref(), content, &samples)
                .await
        };

        let (similarity, classifier, perplexity, burstiness) = tokio::try_join!(
            similarity_leg,
            self.run_provider(self.providers.classifier.as_ref(), content, &[]),
            self.run_provider(self.providers.perplexity.as_ref(), content, &[]),
            self.run_provider(self.providers.burstiness.as_ref(), content, &[]),
        )?;

        let scores = SubScores {
            classifier,
            similarity,
            perplexity,
            burstiness,
        };
        let ai_probability = scores.weighted_sum(&weights);

        info!(
            text_type = %text_type,
            weight_source = ?weight_source,
            ai_probability,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        let record = NewAnalysisRecord {
            title: request.title,
            content: request.content,
            text_type: text_type.clone(),
            ai_probability,
            scores,
            created_at: Utc::now(),
        };
        let record_id = self.persist_best_effort(&record).await;

        Ok(AnalysisOutcome {
            ai_probability,
            scores,
            text_type,
            weights,
            weight_source,
            record_id,
        })
    }

    fn resolve_text_type(&self, requested: Option<&str>) -> String {
        requested
            .and_then(normalize_text_type)
            .unwrap_or_else(|| self.settings.default_text_type.clone())
    }

    /// Walk the fallback chain; store errors degrade to the next tier
    async fn resolve_weights(&self, text_type: &str) -> (ScoreWeights, WeightSource) {
        match self.weight_store.get_active_config(text_type).await {
            Ok(Some(config)) => return (config.weights, WeightSource::TextType),
            Ok(None) => debug!(text_type, "No active weight config for text type"),
            Err(e) => warn!(text_type, error = %e, "Weight config lookup failed, trying default"),
        }

        match self.weight_store.get_default_config().await {
            Ok(Some(config)) => {
                debug!(text_type, default = %config.text_type, "Using default weight config");
                return (config.weights, WeightSource::Default);
            }
            Ok(None) => debug!(text_type, "No default weight config"),
            Err(e) => warn!(text_type, error = %e, "Default weight config lookup failed"),
        }

        (ScoreWeights::EQUAL, WeightSource::Builtin)
    }

    async fn run_provider(
        &self,
        provider: &dyn ScoreProvider,
        content: &str,
        context: &[String],
    ) -> Result<f64, AnalysisError> {
        let kind = provider.kind();
        let timeout = self.settings.provider_timeout;

        let result = match tokio::time::timeout(timeout, provider.score(content, context)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: kind,
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        let score = result.and_then(|score| {
            if score.is_finite() && (0.0..=1.0).contains(&score) {
                Ok(score)
            } else {
                Err(ProviderError::OutOfRange {
                    provider: kind,
                    score,
                })
            }
        });

        match score {
            Ok(score) => {
                debug!(provider = %kind, score, "Provider scored");
                Ok(score)
            }
            Err(e) => {
                error!(provider = %kind, error = %e, "Provider failed");
                Err(e.into())
            }
        }
    }

    /// Store the result; failures are logged and swallowed
    async fn persist_best_effort(&self, record: &NewAnalysisRecord) -> Option<i64> {
        match self.result_store.save(record).await {
            Ok(id) => {
                debug!(record_id = id, "Analysis record stored");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to store analysis record, returning result anyway");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::OfflineSampler;
    use crate::scoring::ScoreKind;
    use aiwd_common::WeightConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Fixed(ScoreKind, f64);

    #[async_trait]
    impl ScoreProvider for Fixed {
        fn kind(&self) -> ScoreKind {
            self.0
        }
        async fn score(&self, _: &str, _: &[String]) -> Result<f64, ProviderError> {
            Ok(self.1)
        }
    }

    /// Sleeps, then counts completion
    struct Slow(ScoreKind, Duration, Arc<AtomicUsize>);

    #[async_trait]
    impl ScoreProvider for Slow {
        fn kind(&self) -> ScoreKind {
            self.0
        }
        async fn score(&self, _: &str, _: &[String]) -> Result<f64, ProviderError> {
            tokio::time::sleep(self.1).await;
            self.2.fetch_add(1, Ordering::SeqCst);
            Ok(0.5)
        }
    }

    struct Failing(ScoreKind);

    #[async_trait]
    impl ScoreProvider for Failing {
        fn kind(&self) -> ScoreKind {
            self.0
        }
        async fn score(&self, _: &str, _: &[String]) -> Result<f64, ProviderError> {
            Err(ProviderError::internal(self.0, "model crashed"))
        }
    }

    /// Sampler whose upstream always answers 503
    struct UnavailableSampler;

    #[async_trait]
    impl GenerativeSampler for UnavailableSampler {
        async fn generate(&self, _: &str, _: usize) -> Result<Vec<String>, SamplerError> {
            Err(SamplerError::MaxRetriesExceeded {
                attempts: 3,
                last_error: "HTTP 503".to_string(),
            })
        }
        fn name(&self) -> &'static str {
            "unavailable"
        }
    }

    #[derive(Default)]
    struct MemoryStores {
        active: Option<WeightConfig>,
        default: Option<WeightConfig>,
        saved: Mutex<Vec<NewAnalysisRecord>>,
    }

    #[async_trait]
    impl WeightConfigStore for MemoryStores {
        async fn get_active_config(&self, text_type: &str) -> aiwd_common::Result<Option<WeightConfig>> {
            Ok(self.active.clone().filter(|c| c.text_type == text_type))
        }
        async fn get_default_config(&self) -> aiwd_common::Result<Option<WeightConfig>> {
            Ok(self.default.clone())
        }
    }

    #[async_trait]
    impl ResultStore for MemoryStores {
        async fn save(&self, record: &NewAnalysisRecord) -> aiwd_common::Result<i64> {
            let mut saved = self.saved.lock().unwrap();
            saved.push(record.clone());
            Ok(saved.len() as i64)
        }
    }

    fn fixed_providers(c: f64, s: f64, p: f64, b: f64) -> ScoreProviders {
        ScoreProviders {
            classifier: Arc::new(Fixed(ScoreKind::Classifier, c)),
            similarity: Arc::new(Fixed(ScoreKind::Similarity, s)),
            perplexity: Arc::new(Fixed(ScoreKind::Perplexity, p)),
            burstiness: Arc::new(Fixed(ScoreKind::Burstiness, b)),
        }
    }

    fn orchestrator(providers: ScoreProviders, stores: Arc<MemoryStores>) -> ScoringOrchestrator {
        ScoringOrchestrator::new(
            providers,
            Arc::new(OfflineSampler::new()),
            stores.clone(),
            stores,
            OrchestratorSettings::default(),
        )
    }

    fn request(content: &str, text_type: Option<&str>) -> AnalysisRequest {
        AnalysisRequest {
            title: "제목".to_string(),
            content: content.to_string(),
            text_type: text_type.map(str::to_string),
        }
    }

    fn config(text_type: &str, weights: ScoreWeights) -> WeightConfig {
        WeightConfig {
            id: 1,
            text_type: text_type.to_string(),
            description: None,
            weights,
            is_active: true,
            is_default: false,
        }
    }

    #[test]
    fn test_validation_counts_characters() {
        // 10 Hangul syllables are 30 bytes but exactly 10 characters
        assert!(request(&"가".repeat(10), None).validate().is_ok());
        assert!(request(&"가".repeat(9), None).validate().is_err());
        assert!(request(&"a".repeat(MAX_CONTENT_CHARS), None).validate().is_ok());
        assert!(request(&"a".repeat(MAX_CONTENT_CHARS + 1), None)
            .validate()
            .is_err());

        let mut long_title = request("충분히 긴 본문 내용입니다", None);
        long_title.title = "t".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(
            long_title.validate(),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_text_type() {
        assert_eq!(normalize_text_type("  Essay "), Some("essay".to_string()));
        assert_eq!(normalize_text_type("   "), None);
        assert_eq!(normalize_text_type(""), None);
    }

    #[tokio::test]
    async fn test_weight_source_tiers() {
        let essay = ScoreWeights::new(0.30, 0.25, 0.20, 0.25);
        let paper = ScoreWeights::new(0.40, 0.20, 0.25, 0.15);
        let stores = Arc::new(MemoryStores {
            active: Some(config("essay", essay)),
            default: Some(config("paper", paper)),
            ..Default::default()
        });
        let orch = orchestrator(fixed_providers(0.5, 0.5, 0.5, 0.5), stores);

        let outcome = orch
            .analyze(request("충분히 긴 본문 내용입니다", Some(" ESSAY ")))
            .await
            .unwrap();
        assert_eq!(outcome.text_type, "essay");
        assert_eq!(outcome.weight_source, WeightSource::TextType);
        assert_eq!(outcome.weights, essay);

        let outcome = orch
            .analyze(request("충분히 긴 본문 내용입니다", Some("news")))
            .await
            .unwrap();
        assert_eq!(outcome.weight_source, WeightSource::Default);
        assert_eq!(outcome.weights, paper);

        let bare = orchestrator(
            fixed_providers(0.5, 0.5, 0.5, 0.5),
            Arc::new(MemoryStores::default()),
        );
        let outcome = bare
            .analyze(request("충분히 긴 본문 내용입니다", Some("")))
            .await
            .unwrap();
        assert_eq!(outcome.text_type, "paper");
        assert_eq!(outcome.weight_source, WeightSource::Builtin);
        assert_eq!(outcome.weights, ScoreWeights::EQUAL);
    }

    #[tokio::test]
    async fn test_out_of_range_score_fails_request() {
        let stores = Arc::new(MemoryStores::default());
        let orch = orchestrator(fixed_providers(0.5, 1.2, 0.5, 0.5), stores.clone());

        let result = orch.analyze(request("충분히 긴 본문 내용입니다", None)).await;
        assert!(matches!(
            result,
            Err(AnalysisError::Provider(ProviderError::OutOfRange {
                provider: ScoreKind::Similarity,
                ..
            }))
        ));
        assert!(stores.saved.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut providers = fixed_providers(0.5, 0.5, 0.5, 0.5);
        providers.burstiness = Arc::new(Slow(
            ScoreKind::Burstiness,
            Duration::from_secs(60),
            completed.clone(),
        ));
        let orch = orchestrator(providers, Arc::new(MemoryStores::default()));

        let result = orch.analyze(request("충분히 긴 본문 내용입니다", None)).await;
        assert!(matches!(
            result,
            Err(AnalysisError::Provider(ProviderError::Timeout {
                provider: ScoreKind::Burstiness,
                timeout_ms: 30_000
            }))
        ));
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cancels_in_flight_providers() {
        let completed = Arc::new(AtomicUsize::new(0));
        let providers = ScoreProviders {
            classifier: Arc::new(Failing(ScoreKind::Classifier)),
            similarity: Arc::new(Slow(ScoreKind::Similarity, Duration::from_secs(5), completed.clone())),
            perplexity: Arc::new(Slow(ScoreKind::Perplexity, Duration::from_secs(5), completed.clone())),
            burstiness: Arc::new(Slow(ScoreKind::Burstiness, Duration::from_secs(5), completed.clone())),
        };
        let stores = Arc::new(MemoryStores::default());
        let orch = orchestrator(providers, stores.clone());

        let result = orch.analyze(request("충분히 긴 본문 내용입니다", None)).await;
        assert!(matches!(result, Err(AnalysisError::Provider(_))));

        // Dropped legs never resume
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        assert!(stores.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sampler_failure_fails_request_without_record() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut providers = fixed_providers(0.5, 0.5, 0.5, 0.5);
        providers.similarity = Arc::new(Slow(ScoreKind::Similarity, Duration::ZERO, calls.clone()));
        let stores = Arc::new(MemoryStores::default());
        let orch = ScoringOrchestrator::new(
            providers,
            Arc::new(UnavailableSampler),
            stores.clone(),
            stores.clone(),
            OrchestratorSettings::default(),
        );

        let result = orch.analyze(request("충분히 긴 본문 내용입니다", None)).await;
        let err = match result {
            Err(err @ AnalysisError::Sampler(SamplerError::MaxRetriesExceeded { .. })) => err,
            other => panic!("expected sampler error, got {:?}", other),
        };
        assert!(err.to_string().contains("HTTP 503"));

        // Similarity never runs without samples
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(stores.saved.lock().unwrap().is_empty());
    }
}
