//! OpenAI-compatible chat-completions client
//!
//! One request asks for all samples at once (`n = count`). Transient failures
//! (timeouts, connection errors, 429, 5xx) are retried with exponential
//! backoff; other 4xx responses fail immediately.

use super::{GenerativeSampler, SamplerError};
use aiwd_common::config::OpenAiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const SYSTEM_MESSAGE: &str = "당신은 한국어 논문 초록을 작성하는 전문 AI입니다.";
const TEMPERATURE: f64 = 0.8;
const MAX_TOKENS: u32 = 200;
const MAX_BACKOFF_MS: u64 = 30_000;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: usize,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Chat-completions sampler
pub struct OpenAiSampler {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl OpenAiSampler {
    pub fn new(api_key: String, config: &OpenAiConfig) -> Result<Self, SamplerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SamplerError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Override the first retry delay (later delays double)
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
    }

    fn prompt_for(content: &str) -> String {
        format!(
            "다음 내용의 텍스트와 유사한 한국어 초록을 200자 내외로 작성해주세요: {}",
            content
        )
    }

    async fn request_with_retry(
        &self,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, SamplerError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_for(attempt);
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    last_error = %last_error,
                    "Retrying sample generation after backoff"
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(SamplerError::Request(e.to_string()));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<ChatCompletionResponse>()
                    .await
                    .map_err(|e| SamplerError::InvalidResponse(e.to_string()));
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{}: {}", status, body);
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(SamplerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Err(SamplerError::MaxRetriesExceeded {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl GenerativeSampler for OpenAiSampler {
    async fn generate(&self, content: &str, count: usize) -> Result<Vec<String>, SamplerError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let prompt = Self::prompt_for(content);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            n: count,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, count, "Requesting comparison samples");
        let response = self.request_with_retry(&request).await?;

        if let Some(usage) = &response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Sample generation token usage"
            );
        }

        let samples: Vec<String> = response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .collect();

        if samples.is_empty() {
            return Err(SamplerError::InvalidResponse(
                "no completion choices returned".to_string(),
            ));
        }

        Ok(samples)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
