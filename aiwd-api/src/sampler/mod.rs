//! Generative comparison samples for the similarity detector
//!
//! The similarity detector compares submitted text against texts an LLM
//! writes on the same subject. [`OpenAiSampler`] calls an OpenAI-compatible
//! chat-completions endpoint; [`OfflineSampler`] is used when no API key is
//! configured so the service stays usable.

pub mod offline;
pub mod openai;

pub use offline::OfflineSampler;
pub use openai::OpenAiSampler;

use async_trait::async_trait;
use thiserror::Error;

/// Sample generation errors
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("Sampler request failed: {0}")]
    Request(String),

    #[error("Sampler API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Sampler gave up after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("Sampler returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Producer of comparison samples
#[async_trait]
pub trait GenerativeSampler: Send + Sync {
    /// Generate `count` texts similar in subject to `content`
    async fn generate(&self, content: &str, count: usize) -> Result<Vec<String>, SamplerError>;

    /// Short identifier for logs
    fn name(&self) -> &'static str;
}
