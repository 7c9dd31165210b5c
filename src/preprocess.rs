//! Text cleanup applied before any keyword or entity matching.

use once_cell::sync::Lazy;
use regex::Regex;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Lowercases, strips punctuation and trims surrounding whitespace.
///
/// Inner whitespace is kept as-is, so multi-word keywords still line up with
/// the user's spacing.
pub fn preprocess_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lower_text = text.to_lowercase();
    PUNCTUATION.replace_all(&lower_text, "").trim().to_string()
}

/// Returns `true` if any keyword occurs as a substring of the already
/// normalized text.
pub fn contains_any(processed_text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| processed_text.contains(k))
}
