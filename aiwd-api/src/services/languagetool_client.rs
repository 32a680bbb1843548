//! LanguageTool-compatible grammar API client
//!
//! Posts form data (`text`, `language`) to a `/v2/check` endpoint and maps
//! each returned match to a [`GrammarIssue`]. LanguageTool reports offsets in
//! UTF-16 code units; they are converted to character offsets here.

use super::grammar_checker::GrammarIssue;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum LanguageToolError {
    #[error("Grammar API request failed: {0}")]
    Network(String),

    #[error("Grammar API error {0}: {1}")]
    Api(u16, String),

    #[error("Grammar API response could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<CheckMatch>,
}

#[derive(Debug, Deserialize)]
struct CheckMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<Replacement>,
    #[serde(default)]
    rule: Option<Rule>,
}

#[derive(Debug, Deserialize)]
struct Replacement {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Rule {
    #[serde(rename = "issueType", default)]
    issue_type: Option<String>,
}

pub struct LanguageToolClient {
    http_client: reqwest::Client,
    api_url: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(api_url: String, language: String) -> Result<Self, LanguageToolError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LanguageToolError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url,
            language,
        })
    }

    pub async fn check(&self, text: &str) -> Result<Vec<GrammarIssue>, LanguageToolError> {
        tracing::debug!(url = %self.api_url, language = %self.language, "Querying grammar API");

        let response = self
            .http_client
            .post(&self.api_url)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| LanguageToolError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LanguageToolError::Api(status.as_u16(), body));
        }

        let parsed: CheckResponse = response
            .json()
            .await
            .map_err(|e| LanguageToolError::Parse(e.to_string()))?;

        let utf16_to_char = utf16_char_map(text);
        let to_char = |utf16: usize| {
            utf16_to_char
                .get(utf16)
                .copied()
                .unwrap_or(text.chars().count())
        };

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| GrammarIssue {
                message: m.message,
                start_index: to_char(m.offset),
                end_index: to_char(m.offset + m.length),
                error_type: m
                    .rule
                    .and_then(|r| r.issue_type)
                    .unwrap_or_else(|| "grammar".to_string()),
                suggestions: m.replacements.into_iter().map(|r| r.value).collect(),
            })
            .collect())
    }
}

/// Map every UTF-16 offset (including the end) to a character offset
fn utf16_char_map(text: &str) -> Vec<usize> {
    let mut map = Vec::with_capacity(text.len() + 1);
    for (char_index, c) in text.chars().enumerate() {
        for _ in 0..c.len_utf16() {
            map.push(char_index);
        }
    }
    map.push(text.chars().count());
    map
}
