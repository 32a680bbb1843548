//! Grammar checking
//!
//! Two backends:
//! - Built-in rules (always available): repeated words, repeated spaces,
//!   space before punctuation, missing space after punctuation, repeated
//!   punctuation
//! - A LanguageTool-compatible HTTP API when `[grammar] api_url` is set

use super::char_offset;
use super::languagetool_client::{LanguageToolClient, LanguageToolError};
use aiwd_common::config::GrammarConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// One grammar problem, positions in characters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrammarIssue {
    pub message: String,
    pub start_index: usize,
    pub end_index: usize,
    /// "grammar", "spacing", "punctuation", "spelling", ...
    pub error_type: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrammarReport {
    pub errors: Vec<GrammarIssue>,
    pub total_errors: usize,
    /// Text with the first suggestion of every issue applied
    pub corrected_text: Option<String>,
}

impl GrammarReport {
    pub fn new(text: &str, errors: Vec<GrammarIssue>) -> Self {
        let corrected_text = Some(apply_corrections(text, &errors));
        Self {
            total_errors: errors.len(),
            errors,
            corrected_text,
        }
    }
}

static REPEATED_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+([.,!?;:])").unwrap());
static MISSING_SPACE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?,])([가-힣A-Z])").unwrap());
static REPEATED_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}|;{2,}|\.{2,}").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

/// Backend-selecting grammar checker
pub enum GrammarChecker {
    Builtin,
    LanguageTool(LanguageToolClient),
}

impl GrammarChecker {
    pub fn from_config(config: &GrammarConfig) -> Result<Self, LanguageToolError> {
        match config.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(GrammarChecker::LanguageTool(
                LanguageToolClient::new(url.to_string(), config.language.clone())?,
            )),
            _ => Ok(GrammarChecker::Builtin),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            GrammarChecker::Builtin => "builtin",
            GrammarChecker::LanguageTool(_) => "languagetool",
        }
    }

    pub async fn check(&self, text: &str) -> Result<GrammarReport, LanguageToolError> {
        let errors = match self {
            GrammarChecker::Builtin => check_builtin(text),
            GrammarChecker::LanguageTool(client) => client.check(text).await?,
        };
        debug!(backend = self.backend_name(), errors = errors.len(), "Grammar check complete");
        Ok(GrammarReport::new(text, errors))
    }
}

fn issue(
    text: &str,
    byte_start: usize,
    byte_end: usize,
    message: String,
    error_type: &str,
    suggestion: String,
) -> GrammarIssue {
    GrammarIssue {
        message,
        start_index: char_offset(text, byte_start),
        end_index: char_offset(text, byte_end),
        error_type: error_type.to_string(),
        suggestions: vec![suggestion],
    }
}

/// Run the built-in rules
///
/// Issues are sorted by position; an issue overlapping an earlier one is
/// dropped so corrections can be applied independently.
pub fn check_builtin(text: &str) -> Vec<GrammarIssue> {
    let mut issues = Vec::new();

    // Repeated word ("the the"): the regex crate has no backreferences
    let words: Vec<_> = WORD.find_iter(text).collect();
    for pair in words.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let between = &text[first.end()..second.start()];
        if !between.is_empty()
            && between.chars().all(char::is_whitespace)
            && first.as_str().to_lowercase() == second.as_str().to_lowercase()
        {
            issues.push(issue(
                text,
                first.start(),
                second.end(),
                format!("반복된 단어: '{}'", first.as_str()),
                "grammar",
                first.as_str().to_string(),
            ));
        }
    }

    for m in REPEATED_SPACES.find_iter(text) {
        issues.push(issue(
            text,
            m.start(),
            m.end(),
            "불필요한 공백이 연속되어 있습니다".to_string(),
            "spacing",
            " ".to_string(),
        ));
    }

    for caps in SPACE_BEFORE_PUNCT.captures_iter(text) {
        let (Some(all), Some(punct)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        issues.push(issue(
            text,
            all.start(),
            all.end(),
            format!("문장 부호 '{}' 앞의 공백을 제거하세요", punct.as_str()),
            "punctuation",
            punct.as_str().to_string(),
        ));
    }

    for caps in MISSING_SPACE_AFTER.captures_iter(text) {
        let (Some(all), Some(punct), Some(next)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        issues.push(issue(
            text,
            all.start(),
            all.end(),
            format!("문장 부호 '{}' 뒤에 공백이 필요합니다", punct.as_str()),
            "punctuation",
            format!("{} {}", punct.as_str(), next.as_str()),
        ));
    }

    for m in REPEATED_PUNCT.find_iter(text) {
        // "..." is an ellipsis, not a typo
        if m.as_str() == "..." {
            continue;
        }
        let single = &m.as_str()[..1];
        issues.push(issue(
            text,
            m.start(),
            m.end(),
            format!("문장 부호 '{}'가 반복되었습니다", single),
            "punctuation",
            single.to_string(),
        ));
    }

    issues.sort_by_key(|i| (i.start_index, i.end_index));

    let mut accepted: Vec<GrammarIssue> = Vec::with_capacity(issues.len());
    for issue in issues {
        let overlaps = accepted
            .last()
            .is_some_and(|prev| issue.start_index < prev.end_index);
        if !overlaps {
            accepted.push(issue);
        }
    }
    accepted
}

/// Apply each issue's first suggestion, right to left so earlier offsets stay
/// valid. Overlapping or out-of-bounds issues are skipped.
pub fn apply_corrections(text: &str, issues: &[GrammarIssue]) -> String {
    let mut chars: Vec<char> = text.chars().collect();

    let mut ordered: Vec<&GrammarIssue> = issues
        .iter()
        .filter(|i| !i.suggestions.is_empty())
        .collect();
    ordered.sort_by_key(|i| std::cmp::Reverse(i.start_index));

    let mut boundary = chars.len();
    for issue in ordered {
        if issue.start_index > issue.end_index || issue.end_index > boundary {
            continue;
        }
        chars.splice(
            issue.start_index..issue.end_index,
            issue.suggestions[0].chars(),
        );
        boundary = issue.start_index;
    }

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_has_no_issues() {
        let report = GrammarReport::new(
            "오늘은 날씨가 좋습니다. 산책을 했습니다.",
            check_builtin("오늘은 날씨가 좋습니다. 산책을 했습니다."),
        );
        assert_eq!(report.total_errors, 0);
        assert_eq!(
            report.corrected_text.as_deref(),
            Some("오늘은 날씨가 좋습니다. 산책을 했습니다.")
        );
    }

    #[test]
    fn test_repeated_word_uses_char_offsets() {
        let text = "우리는 정말 정말 기뻤다.";
        let issues = check_builtin(text);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].error_type, "grammar");
        assert_eq!(issues[0].start_index, 4);
        assert_eq!(issues[0].end_index, 9);
        assert_eq!(apply_corrections(text, &issues), "우리는 정말 기뻤다.");
    }

    #[test]
    fn test_spacing_and_punctuation_rules() {
        let text = "안녕하세요  반갑습니다 .그리고,,끝";
        let issues = check_builtin(text);
        let types: Vec<_> = issues.iter().map(|i| i.error_type.as_str()).collect();

        assert_eq!(types, vec!["spacing", "punctuation", "punctuation"]);
        assert_eq!(
            apply_corrections(text, &issues),
            "안녕하세요 반갑습니다.그리고,끝"
        );
    }

    #[test]
    fn test_missing_space_after_sentence_end() {
        let text = "첫 문장입니다.두 번째 문장입니다.";
        let issues = check_builtin(text);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].suggestions, vec![". 두"]);
        assert_eq!(
            apply_corrections(text, &issues),
            "첫 문장입니다. 두 번째 문장입니다."
        );
    }

    #[test]
    fn test_ellipsis_is_allowed() {
        assert!(check_builtin("그래서... 결국 떠났다").is_empty());
        assert_eq!(check_builtin("그래서.. 결국 떠났다").len(), 1);
    }

    #[test]
    fn test_apply_corrections_skips_out_of_bounds() {
        let issue = GrammarIssue {
            message: "bad".to_string(),
            start_index: 5,
            end_index: 50,
            error_type: "grammar".to_string(),
            suggestions: vec!["x".to_string()],
        };
        assert_eq!(apply_corrections("short", &[issue]), "short");
    }

    #[tokio::test]
    async fn test_builtin_backend_selected_without_url() {
        let checker = GrammarChecker::from_config(&GrammarConfig::default()).unwrap();
        assert_eq!(checker.backend_name(), "builtin");

        let report = checker.check("문장  두 개").await.unwrap();
        assert_eq!(report.total_errors, 1);
        assert_eq!(report.corrected_text.as_deref(), Some("문장 두 개"));
    }
}
