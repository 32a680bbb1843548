//! Writing assistant: creativity scoring and improvement suggestions

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const BASE_SCORE: f64 = 70.0;
const FORMAL_PENALTY: f64 = 5.0;
const FIGURATIVE_BONUS: f64 = 3.0;
const EMOTIVE_BONUS: f64 = 2.0;

const FORMAL_PHRASES: [&str; 3] = ["할 수 있습니다", "하는 것이 중요합니다", "결론적으로"];
const FIGURATIVE_MARKERS: [&str; 4] = ["마치", "처럼", "같은", "듯"];
const EMOTIVE_MARKERS: [&str; 4] = ["!", "정말", "너무", "과연"];

/// (pattern, replacement, explanation)
const CREATIVITY_REPLACEMENTS: [(&str, &str, &str); 3] = [
    ("중요한 점은", "핵심은", "더 직관적인 표현으로 바꾸면 읽기 편해요"),
    ("할 수 있습니다", "할 수 있어요", "친근한 어조로 개성을 더해보세요"),
    ("결론적으로", "결국", "간결한 전환어로 자연스러움을 높여요"),
];

const TONE_REPLACEMENTS: [(&str, &str, &str); 2] = [
    ("입니다", "이에요", "더 친근한 어조로 독자와 가까워져요"),
    ("하는 것이", "하기", "간결하고 자연스러운 표현이 좋아요"),
];

static DUPLICATE_INTENSIFIERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(매우|정말|너무|아주)\s+(매우|정말|너무|아주)").unwrap());

/// Which aspect suggestions target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementFocus {
    Creativity,
    Tone,
    Clarity,
    #[default]
    All,
    /// Any unrecognized focus; matches no suggestion category
    #[serde(other)]
    Unrecognized,
}

impl ImprovementFocus {
    fn includes(self, other: ImprovementFocus) -> bool {
        self == ImprovementFocus::All || self == other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementSuggestion {
    pub original_text: String,
    pub improved_text: String,
    pub improvement_type: String,
    pub explanation: String,
}

/// Creativity score in 0..=100
///
/// Starts at 70; each formal phrase costs 5, each figurative marker adds 3 and
/// each emotive marker adds 2.
pub fn creativity_score(text: &str) -> f64 {
    let count = |markers: &[&str]| -> f64 {
        markers.iter().map(|m| text.matches(m).count()).sum::<usize>() as f64
    };

    let score = BASE_SCORE - count(&FORMAL_PHRASES) * FORMAL_PENALTY
        + count(&FIGURATIVE_MARKERS) * FIGURATIVE_BONUS
        + count(&EMOTIVE_MARKERS) * EMOTIVE_BONUS;

    score.clamp(0.0, 100.0)
}

fn replacement_suggestions(
    text: &str,
    table: &[(&str, &str, &str)],
    improvement_type: &str,
) -> Vec<ImprovementSuggestion> {
    table
        .iter()
        .flat_map(|(pattern, replacement, explanation)| {
            text.matches(pattern).map(move |original| ImprovementSuggestion {
                original_text: original.to_string(),
                improved_text: replacement.to_string(),
                improvement_type: improvement_type.to_string(),
                explanation: explanation.to_string(),
            })
        })
        .collect()
}

pub fn suggest_improvements(text: &str, focus: ImprovementFocus) -> Vec<ImprovementSuggestion> {
    let mut suggestions = Vec::new();

    if focus.includes(ImprovementFocus::Creativity) {
        suggestions.extend(replacement_suggestions(
            text,
            &CREATIVITY_REPLACEMENTS,
            "creativity",
        ));
    }

    if focus.includes(ImprovementFocus::Tone) {
        suggestions.extend(replacement_suggestions(text, &TONE_REPLACEMENTS, "tone"));
    }

    if focus.includes(ImprovementFocus::Clarity) {
        for caps in DUPLICATE_INTENSIFIERS.captures_iter(text) {
            let (Some(all), Some(kept)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            suggestions.push(ImprovementSuggestion {
                original_text: all.as_str().to_string(),
                improved_text: kept.as_str().to_string(),
                improvement_type: "clarity".to_string(),
                explanation: "중복 강조어를 제거하면 더 명확해져요".to_string(),
            });
        }
    }

    suggestions
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteResult {
    pub original: String,
    pub rewritten: String,
    pub style: String,
    pub explanation: String,
}

pub fn rewrite(content: &str, style: &str) -> RewriteResult {
    let rewritten = content.replace("입니다", "이에요").replace("중요한", "핵심적인");

    RewriteResult {
        original: content.to_string(),
        rewritten,
        style: style.to_string(),
        explanation: format!("{} 스타일로 더 자연스럽게 다시 작성했어요", style),
    }
}
