//! Title screening heuristic applied before a project enters review.
//!
//! # Responsibility
//! - Score a candidate title by topical keyword coverage.
//! - Reject titles below the word/length floor before scoring.
//!
//! # Invariants
//! - Pure and deterministic; no I/O.
//! - Floor checks are inclusive: 3 words and 15 characters pass.
//! - Keywords are matched as case-insensitive substrings and each counts once.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Minimum number of whitespace-separated words.
pub const MIN_TITLE_WORDS: usize = 3;
/// Minimum character count of the trimmed title.
pub const MIN_TITLE_CHARS: usize = 15;
/// Minimum keyword score for acceptance.
pub const MIN_ACCEPTED_SCORE: u32 = 1;

/// Canonical topical keyword set.
pub const TITLE_KEYWORDS: &[&str] = &[
    "system",
    "management",
    "application",
    "portal",
    "app",
    "online",
    "attendance",
    "library",
    "student",
    "college",
    "project",
    "automation",
];

/// Why a title was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TitleRejection {
    /// Failed the word or length floor.
    TooShort { words: usize, chars: usize },
    /// Met the floor but matched no keyword.
    NoKeywords,
}

impl Display for TitleRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { words, chars } => write!(
                f,
                "title too short: {words} words / {chars} characters, need at least {MIN_TITLE_WORDS} words and {MIN_TITLE_CHARS} characters"
            ),
            Self::NoKeywords => write!(f, "title not suitable for a final year project"),
        }
    }
}

/// Outcome of one title evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleEvaluation {
    pub accepted: bool,
    pub score: u32,
    pub rejection: Option<TitleRejection>,
}

/// Evaluates one candidate title.
pub fn evaluate_title(title: &str) -> TitleEvaluation {
    let trimmed = title.trim();
    let words = trimmed.split_whitespace().count();
    let chars = trimmed.chars().count();

    if words < MIN_TITLE_WORDS || chars < MIN_TITLE_CHARS {
        return TitleEvaluation {
            accepted: false,
            score: 0,
            rejection: Some(TitleRejection::TooShort { words, chars }),
        };
    }

    let lowered = trimmed.to_lowercase();
    let score = TITLE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count() as u32;

    let accepted = score >= MIN_ACCEPTED_SCORE;
    TitleEvaluation {
        accepted,
        score,
        rejection: (!accepted).then_some(TitleRejection::NoKeywords),
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate_title, TitleRejection};

    #[test]
    fn keyword_repeated_counts_once() {
        let evaluation = evaluate_title("system system system design");
        assert!(evaluation.accepted);
        assert_eq!(evaluation.score, 1);
    }

    #[test]
    fn app_matches_inside_application() {
        let evaluation = evaluate_title("Mobile Application Builder");
        assert_eq!(evaluation.score, 2);
    }

    #[test]
    fn surrounding_whitespace_does_not_count_toward_length() {
        let evaluation = evaluate_title("   a b cdefghij   ");
        assert_eq!(
            evaluation.rejection,
            Some(TitleRejection::TooShort { words: 3, chars: 12 })
        );
    }
}
