//! AI-like phrase highlighting
//!
//! Pattern-based heuristic: formulaic Korean expressions that generated text
//! tends to overuse are located and scored.

use super::{char_offset, round3};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

struct AiPattern {
    regex: Regex,
    reason: &'static str,
    score: f64,
}

static AI_PATTERNS: Lazy<Vec<AiPattern>> = Lazy::new(|| {
    [
        (r"중요한 점은[^.!?]*[.!?]", "형식적인 강조 표현", 0.7),
        (r"결론적으로[^.!?]*[.!?]", "형식적인 전환 표현", 0.75),
        (
            r"먼저[,\s]+[^.!?]*[.!?].*둘째[,\s]+[^.!?]*[.!?]",
            "구조적 나열 패턴",
            0.8,
        ),
        (r"할 수 있습니다[.!?]", "과도한 정중 표현", 0.65),
        (r"하는 것이 중요합니다[.!?]", "일반적인 조언 패턴", 0.7),
        (r"다양한[^.!?]*있습니다", "모호한 일반화", 0.6),
        (r"에 대해 살펴보[^.!?]*[.!?]", "형식적인 안내 표현", 0.7),
        (r"이러한[^.!?]*통해", "형식적 연결어", 0.65),
    ]
    .into_iter()
    .map(|(pattern, reason, score)| AiPattern {
        regex: Regex::new(pattern).unwrap(),
        reason,
        score,
    })
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightSegment {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    pub ai_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightReport {
    pub segments: Vec<HighlightSegment>,
    pub overall_ai_ratio: f64,
}

/// All pattern matches, ordered by start position
pub fn detect_ai_like_segments(text: &str) -> Vec<HighlightSegment> {
    let mut segments: Vec<HighlightSegment> = AI_PATTERNS
        .iter()
        .flat_map(|pattern| {
            pattern.regex.find_iter(text).map(move |m| HighlightSegment {
                text: m.as_str().to_string(),
                start_index: char_offset(text, m.start()),
                end_index: char_offset(text, m.end()),
                ai_score: pattern.score,
                reason: pattern.reason.to_string(),
            })
        })
        .collect();

    segments.sort_by_key(|s| (s.start_index, s.end_index));
    segments
}

/// Share of characters covered by at least one segment, rounded to 3 decimals
///
/// Overlapping segments are counted once, so the ratio never exceeds 1.
pub fn ai_ratio(text: &str, segments: &[HighlightSegment]) -> f64 {
    let total = text.chars().count();
    if total == 0 || segments.is_empty() {
        return 0.0;
    }

    let mut covered = 0;
    let mut cursor = 0;
    for segment in segments {
        let start = segment.start_index.max(cursor);
        if segment.end_index > start {
            covered += segment.end_index - start;
            cursor = segment.end_index;
        }
    }

    round3(covered as f64 / total as f64)
}

pub fn analyze(text: &str) -> HighlightReport {
    let segments = detect_ai_like_segments(text);
    let overall_ai_ratio = ai_ratio(text, &segments);
    HighlightReport {
        segments,
        overall_ai_ratio,
    }
}
