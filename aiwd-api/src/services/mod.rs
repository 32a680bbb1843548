//! Auxiliary text services
//!
//! Heuristic tools that complement the AI-likelihood score: grammar checking,
//! plagiarism detection, AI-like phrase highlighting and writing suggestions.
//! All positions reported to clients are character offsets, not byte offsets.

pub mod grammar_checker;
pub mod highlighter;
pub mod languagetool_client;
pub mod plagiarism_checker;
pub mod writing_assistant;

pub use grammar_checker::{GrammarChecker, GrammarIssue, GrammarReport};
pub use highlighter::{HighlightReport, HighlightSegment};
pub use plagiarism_checker::{MatchedSource, PlagiarismReport};
pub use writing_assistant::{ImprovementFocus, ImprovementSuggestion};

/// Convert a byte offset inside `text` to a character offset
pub(crate) fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

/// Round to three decimals
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
