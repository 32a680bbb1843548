//! Plagiarism / similarity detection against stored analyses
//!
//! Similarity is the Jaccard index of word 3-gram sets, rounded to three
//! decimals. Sources at or above [`MATCH_THRESHOLD`] are reported; the text is
//! flagged when the best match reaches [`PLAGIARISM_THRESHOLD`].

use super::round3;
use aiwd_common::db::AnalysisRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

pub const MATCH_THRESHOLD: f64 = 0.4;
pub const PLAGIARISM_THRESHOLD: f64 = 0.7;
/// Sentences must be longer than this (in characters) to be key phrases
pub const MIN_PHRASE_CHARS: usize = 20;
pub const MAX_KEY_PHRASES: usize = 5;
const NGRAM_SIZE: usize = 3;
const EXCERPT_CHARS: usize = 100;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSource {
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub similarity_score: f64,
    pub matched_text: String,
    /// Stored analysis the match came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlagiarismReport {
    pub overall_similarity: f64,
    pub matched_sources: Vec<MatchedSource>,
    pub is_plagiarized: bool,
    /// SHA-256 of the checked content, hex encoded
    pub content_hash: String,
}

impl PlagiarismReport {
    pub fn new(content: &str, matched_sources: Vec<MatchedSource>) -> Self {
        let overall_similarity = matched_sources
            .iter()
            .map(|s| s.similarity_score)
            .fold(0.0, f64::max);

        Self {
            overall_similarity,
            is_plagiarized: overall_similarity >= PLAGIARISM_THRESHOLD,
            matched_sources,
            content_hash: content_hash(content),
        }
    }
}

/// Longest sentences first, at most `max_phrases`
pub fn extract_key_phrases(text: &str, max_phrases: usize) -> Vec<String> {
    let mut sentences: Vec<String> = SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_PHRASE_CHARS)
        .map(str::to_string)
        .collect();

    sentences.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    sentences.truncate(max_phrases);
    sentences
}

fn word_ngrams(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    words
        .windows(NGRAM_SIZE)
        .map(|w| w.join(" "))
        .collect()
}

/// Jaccard similarity of word 3-grams in [0, 1], rounded to 3 decimals
///
/// Texts shorter than three words have no 3-grams and score 0.
pub fn ngram_similarity(a: &str, b: &str) -> f64 {
    let left = word_ngrams(a);
    let right = word_ngrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    round3(intersection as f64 / union as f64)
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare `content` with stored analyses, best matches first
pub fn compare_with_records(content: &str, records: &[AnalysisRecord]) -> Vec<MatchedSource> {
    let key_phrases = extract_key_phrases(content, MAX_KEY_PHRASES);

    let mut matches: Vec<MatchedSource> = records
        .iter()
        .filter_map(|record| {
            let score = ngram_similarity(content, &record.content);
            if score < MATCH_THRESHOLD {
                return None;
            }

            let matched_text = key_phrases
                .iter()
                .find(|phrase| record.content.contains(phrase.as_str()))
                .cloned()
                .unwrap_or_else(|| record.content.chars().take(EXCERPT_CHARS).collect());

            Some(MatchedSource {
                source_url: None,
                source_title: Some(record.title.clone()),
                similarity_score: score,
                matched_text,
                record_id: Some(record.id),
            })
        })
        .collect();

    matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    matches
}
