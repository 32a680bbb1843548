//! Template samples used when no generative API key is configured

use super::{GenerativeSampler, SamplerError};
use async_trait::async_trait;

/// Number of leading characters of the input quoted in each template
const QUOTE_CHARS: usize = 50;

const TEMPLATES: [&str; 3] = ["에 대한 AI 초록 예시", "관련 요약 샘플", "비교용 텍스트"];

#[derive(Debug, Clone, Default)]
pub struct OfflineSampler;

impl OfflineSampler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerativeSampler for OfflineSampler {
    async fn generate(&self, content: &str, count: usize) -> Result<Vec<String>, SamplerError> {
        let quote: String = content.chars().take(QUOTE_CHARS).collect();

        Ok((0..count)
            .map(|i| {
                format!(
                    "[샘플 {}] {} ... {}",
                    i + 1,
                    quote,
                    TEMPLATES[i % TEMPLATES.len()]
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
