//! Placeholder detectors
//!
//! Stand-ins for the KoBERT, SBERT, perplexity and burstiness models. Each
//! waits for a model-like latency and returns a uniformly random score within
//! the range the real model is expected to produce.

use super::{ProviderError, ScoreKind, ScoreProvider};
use async_trait::async_trait;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

/// Bounded random scorer with optional simulated latency
#[derive(Debug, Clone)]
pub struct SimulatedScorer {
    kind: ScoreKind,
    range: RangeInclusive<f64>,
    /// Latency bounds in milliseconds; `None` answers immediately
    latency_ms: Option<RangeInclusive<u64>>,
}

impl SimulatedScorer {
    pub fn new(kind: ScoreKind, range: RangeInclusive<f64>, latency_ms: Option<RangeInclusive<u64>>) -> Self {
        Self {
            kind,
            range,
            latency_ms,
        }
    }

    /// KoBERT classifier: 0.0..=1.0 after 1-2 s
    pub fn classifier(simulate_latency: bool) -> Self {
        Self::new(
            ScoreKind::Classifier,
            0.0..=1.0,
            simulate_latency.then_some(1000..=2000),
        )
    }

    /// SBERT similarity: 0.3..=0.9 after 0.5 s
    pub fn similarity(simulate_latency: bool) -> Self {
        Self::new(
            ScoreKind::Similarity,
            0.3..=0.9,
            simulate_latency.then_some(500..=500),
        )
    }

    /// Perplexity: 0.2..=0.8 after 0.7 s
    pub fn perplexity(simulate_latency: bool) -> Self {
        Self::new(
            ScoreKind::Perplexity,
            0.2..=0.8,
            simulate_latency.then_some(700..=700),
        )
    }

    /// Burstiness: 0.3..=0.85 after 0.6 s
    pub fn burstiness(simulate_latency: bool) -> Self {
        Self::new(
            ScoreKind::Burstiness,
            0.3..=0.85,
            simulate_latency.then_some(600..=600),
        )
    }
}

#[async_trait]
impl ScoreProvider for SimulatedScorer {
    fn kind(&self) -> ScoreKind {
        self.kind
    }

    async fn score(&self, content: &str, context: &[String]) -> Result<f64, ProviderError> {
        debug!(
            provider = %self.kind,
            chars = content.chars().count(),
            samples = context.len(),
            "Scoring"
        );

        if let Some(latency) = self.latency_ms.clone() {
            let delay = rand::thread_rng().gen_range(latency);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        // Model inference is CPU-bound; keep it off the async workers
        let range = self.range.clone();
        let score = tokio::task::spawn_blocking(move || rand::thread_rng().gen_range(range))
            .await
            .map_err(|e| ProviderError::internal(self.kind, format!("Scoring task failed: {}", e)))?;

        if !(0.0..=1.0).contains(&score) {
            return Err(ProviderError::OutOfRange {
                provider: self.kind,
                score,
            });
        }

        Ok(score)
    }
}
