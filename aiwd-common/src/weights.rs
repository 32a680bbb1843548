//! Score weight model
//!
//! A weight configuration holds four coefficients that combine the detector
//! sub-scores into the final AI probability. Rows are keyed by text type
//! ("paper", "essay", "blog", ...). When no row applies, the orchestrator
//! falls back to [`ScoreWeights::EQUAL`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Allowed deviation of the coefficient sum from 1.0 before a warning is logged
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Four combination coefficients, one per detector signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// KoBERT classifier probability
    pub classifier: f64,
    /// SBERT similarity against generated samples
    pub similarity: f64,
    /// Perplexity-derived probability
    pub perplexity: f64,
    /// Burstiness-derived probability
    pub burstiness: f64,
}

impl ScoreWeights {
    /// Built-in fallback used when neither a type-specific nor a default
    /// configuration exists.
    pub const EQUAL: ScoreWeights = ScoreWeights {
        classifier: 0.25,
        similarity: 0.25,
        perplexity: 0.25,
        burstiness: 0.25,
    };

    pub fn new(classifier: f64, similarity: f64, perplexity: f64, burstiness: f64) -> Self {
        Self {
            classifier,
            similarity,
            perplexity,
            burstiness,
        }
    }

    pub fn sum(&self) -> f64 {
        self.classifier + self.similarity + self.perplexity + self.burstiness
    }

    /// Whether the coefficients sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`]
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Log a warning when the coefficients do not sum to ~1.0.
    ///
    /// Never rejects: an unnormalized configuration is still usable and the
    /// final probability may then leave [0, 1].
    pub fn warn_if_unnormalized(&self, text_type: &str) -> bool {
        let normalized = self.is_normalized();
        if !normalized {
            warn!(
                text_type,
                weight_sum = self.sum(),
                "Weight coefficients do not sum to 1.0 (recommended)"
            );
        }
        normalized
    }

    /// Check every coefficient is a finite value within [0, 1]
    pub fn validate_range(&self) -> Result<(), String> {
        let fields = [
            ("kobert_weight", self.classifier),
            ("sbert_weight", self.similarity),
            ("perplexity_weight", self.perplexity),
            ("burstiness_weight", self.burstiness),
        ];
        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within 0.0..=1.0 (got {})", name, value));
            }
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::EQUAL
    }
}

/// Individual detector outputs for one analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub classifier: f64,
    pub similarity: f64,
    pub perplexity: f64,
    pub burstiness: f64,
}

impl SubScores {
    /// Weighted combination `Σ score_i * weight_i`.
    ///
    /// No clamping: weights that do not sum to 1.0 may push the result outside
    /// [0, 1], which is accepted.
    pub fn weighted_sum(&self, weights: &ScoreWeights) -> f64 {
        self.classifier * weights.classifier
            + self.similarity * weights.similarity
            + self.perplexity * weights.perplexity
            + self.burstiness * weights.burstiness
    }
}

/// Stored weight configuration row
#[derive(Debug, Clone, PartialEq)]
pub struct WeightConfig {
    pub id: i64,
    pub text_type: String,
    pub description: Option<String>,
    pub weights: ScoreWeights,
    pub is_active: bool,
    pub is_default: bool,
}

/// Fields for creating a weight configuration
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeightConfig {
    pub text_type: String,
    pub description: Option<String>,
    pub weights: ScoreWeights,
    pub is_active: bool,
    pub is_default: bool,
}

/// Partial update of a weight configuration; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightConfigPatch {
    pub description: Option<String>,
    pub classifier: Option<f64>,
    pub similarity: Option<f64>,
    pub perplexity: Option<f64>,
    pub burstiness: Option<f64>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
}

impl WeightConfigPatch {
    /// Apply the patch on top of an existing row
    pub fn apply_to(&self, current: &WeightConfig) -> WeightConfig {
        WeightConfig {
            id: current.id,
            text_type: current.text_type.clone(),
            description: self.description.clone().or_else(|| current.description.clone()),
            weights: ScoreWeights {
                classifier: self.classifier.unwrap_or(current.weights.classifier),
                similarity: self.similarity.unwrap_or(current.weights.similarity),
                perplexity: self.perplexity.unwrap_or(current.weights.perplexity),
                burstiness: self.burstiness.unwrap_or(current.weights.burstiness),
            },
            is_active: self.is_active.unwrap_or(current.is_active),
            is_default: self.is_default.unwrap_or(current.is_default),
        }
    }
}

/// Preset configurations seeded by the admin "init defaults" operation
pub fn preset_configs() -> Vec<NewWeightConfig> {
    vec![
        NewWeightConfig {
            text_type: "paper".to_string(),
            description: Some("Academic papers (formality and accuracy)".to_string()),
            weights: ScoreWeights::new(0.40, 0.20, 0.25, 0.15),
            is_active: true,
            is_default: true,
        },
        NewWeightConfig {
            text_type: "essay".to_string(),
            description: Some("Essays (creativity and variety)".to_string()),
            weights: ScoreWeights::new(0.30, 0.25, 0.20, 0.25),
            is_active: true,
            is_default: false,
        },
        NewWeightConfig {
            text_type: "blog".to_string(),
            description: Some("Blogs and social posts (naturalness)".to_string()),
            weights: ScoreWeights::new(0.25, 0.30, 0.20, 0.25),
            is_active: true,
            is_default: false,
        },
    ]
}
