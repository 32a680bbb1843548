//! AI-likelihood scoring pipeline
//!
//! Four independent detectors each produce a probability in [0, 1]:
//!
//! | Kind         | Signal                                        |
//! |--------------|-----------------------------------------------|
//! | `Classifier` | KoBERT AI/human classifier                    |
//! | `Similarity` | SBERT similarity against generated samples    |
//! | `Perplexity` | Language-model perplexity                     |
//! | `Burstiness` | Sentence length/complexity variation          |
//!
//! The [`orchestrator::ScoringOrchestrator`] runs them concurrently and
//! combines their outputs with per-text-type weights.

pub mod orchestrator;
pub mod simulated;
pub mod stores;

pub use orchestrator::{
    AnalysisError, AnalysisOutcome, AnalysisRequest, OrchestratorSettings, ScoringOrchestrator,
    WeightSource,
};
pub use simulated::SimulatedScorer;
pub use stores::{ResultStore, SqliteResultStore, SqliteWeightStore, WeightConfigStore};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Detector identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Classifier,
    Similarity,
    Perplexity,
    Burstiness,
}

impl ScoreKind {
    /// Stable name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Classifier => "kobert",
            ScoreKind::Similarity => "sbert",
            ScoreKind::Perplexity => "perplexity",
            ScoreKind::Burstiness => "burstiness",
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{provider} scorer timed out after {timeout_ms} ms")]
    Timeout { provider: ScoreKind, timeout_ms: u64 },

    #[error("{provider} scorer failed: {message}")]
    Internal { provider: ScoreKind, message: String },

    #[error("{provider} scorer returned out-of-range score {score}")]
    OutOfRange { provider: ScoreKind, score: f64 },
}

impl ProviderError {
    pub fn internal(provider: ScoreKind, message: impl Into<String>) -> Self {
        ProviderError::Internal {
            provider,
            message: message.into(),
        }
    }
}

/// A pluggable detector
///
/// Implementations must be cheap to call concurrently. CPU-heavy work belongs
/// on `tokio::task::spawn_blocking`.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    fn kind(&self) -> ScoreKind;

    /// Score `content`; `context` carries generated comparison samples and is
    /// only meaningful to the similarity detector.
    async fn score(&self, content: &str, context: &[String]) -> Result<f64, ProviderError>;
}

/// The four detectors used by one orchestrator
#[derive(Clone)]
pub struct ScoreProviders {
    pub classifier: Arc<dyn ScoreProvider>,
    pub similarity: Arc<dyn ScoreProvider>,
    pub perplexity: Arc<dyn ScoreProvider>,
    pub burstiness: Arc<dyn ScoreProvider>,
}

impl ScoreProviders {
    /// Placeholder detectors producing bounded random scores
    pub fn simulated(simulate_latency: bool) -> Self {
        Self {
            classifier: Arc::new(SimulatedScorer::classifier(simulate_latency)),
            similarity: Arc::new(SimulatedScorer::similarity(simulate_latency)),
            perplexity: Arc::new(SimulatedScorer::perplexity(simulate_latency)),
            burstiness: Arc::new(SimulatedScorer::burstiness(simulate_latency)),
        }
    }
}
