//! Phrase extraction.
//!
//! A policy statement is split into the chunks that are embedded and
//! compared against the field catalog. Splitting happens on the
//! conjunctions `and`/`or` (whole words, any case) and on commas and
//! periods.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Phrase boundaries: whole-word `and`/`or`, `,` and `.`
    static ref PHRASE_BOUNDARY: Regex = Regex::new(r"(?i)\band\b|\bor\b|,|\.").unwrap();
}

/// Chunks shorter than this (in characters, after trimming) are dropped.
pub const MIN_PHRASE_CHARS: usize = 4;

/// Split a prompt into semantic phrases.
///
/// Never returns an empty list: when no chunk survives the length filter
/// the whole trimmed prompt is returned as the only phrase.
pub fn extract_phrases(prompt: &str) -> Vec<String> {
    let phrases: Vec<String> = PHRASE_BOUNDARY
        .split(prompt)
        .map(str::trim)
        .filter(|chunk| chunk.chars().count() >= MIN_PHRASE_CHARS)
        .map(str::to_string)
        .collect();

    if phrases.is_empty() {
        vec![prompt.trim().to_string()]
    } else {
        phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_conjunctions() {
        let phrases = extract_phrases("bureau score below 600 and overdue amount above 50000");
        assert_eq!(
            phrases,
            vec!["bureau score below 600", "overdue amount above 50000"]
        );
    }

    #[test]
    fn test_splits_on_punctuation_and_or() {
        let phrases =
            extract_phrases("Reject if FOIR above 0.6, OR monthly income below 25000. Approve otherwise");
        assert_eq!(
            phrases,
            vec![
                "Reject if FOIR above 0",
                "monthly income below 25000",
                "Approve otherwise"
            ]
        );
    }

    #[test]
    fn test_conjunctions_inside_words_are_kept() {
        let phrases = extract_phrases("Andrew orders a brand new loan");
        assert_eq!(phrases, vec!["Andrew orders a brand new loan"]);
    }

    #[test]
    fn test_short_chunks_dropped() {
        let phrases = extract_phrases("age > 21 and ok, foir < 0.5");
        assert_eq!(phrases, vec!["age > 21", "foir < 0"]);
    }

    #[test]
    fn test_falls_back_to_whole_prompt() {
        assert_eq!(extract_phrases("  a, b and c  "), vec!["a, b and c"]);
        assert_eq!(extract_phrases("ltv"), vec!["ltv"]);
    }

    #[test]
    fn test_empty_prompt_still_yields_one_phrase() {
        assert_eq!(extract_phrases(""), vec![""]);
        assert_eq!(extract_phrases("   "), vec![""]);
    }
}
