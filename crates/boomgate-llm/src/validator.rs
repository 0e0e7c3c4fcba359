//! Response validator.
//!
//! Free providers often answer a failed call with an HTML error page or a
//! terse error string on a successful transport. [`validate`] separates
//! those from real answers.

use std::fmt;

/// Responses shorter than this (after trimming, in characters) are rejected.
pub const MIN_LEN: usize = 10;

/// Responses shorter than this are rejected when they contain a blocklisted term.
pub const SHORT_LEN: usize = 100;

/// Case-insensitive markers of an error page instead of generated text.
const MARKUP_MARKERS: &[&str] = &["<html", "<!doctype"];

/// Case-insensitive substrings that indicate an error message.
const BLOCKLIST: &[&str] = &[
    "error",
    "exception",
    "blocked",
    "forbidden",
    "403",
    "unavailable",
    "timeout",
];

/// Why a response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace only.
    Empty,
    /// Contains an HTML marker.
    Markup,
    /// Shorter than [`MIN_LEN`].
    TooShort(usize),
    /// Short and contains the given blocklisted term.
    ErrorPhrase(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty response"),
            Self::Markup => f.write_str("markup in response"),
            Self::TooShort(len) => write!(f, "response too short ({len} chars)"),
            Self::ErrorPhrase(term) => write!(f, "error phrase \"{term}\" in short response"),
        }
    }
}

/// Classify a raw backend response.
///
/// Returns the trimmed text on acceptance.
pub fn validate(raw: &str) -> Result<String, Rejection> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(Rejection::Empty);
    }

    let lower = text.to_lowercase();
    if contains_markup(&lower) {
        return Err(Rejection::Markup);
    }

    let len = text.chars().count();
    if len < MIN_LEN {
        return Err(Rejection::TooShort(len));
    }
    if len < SHORT_LEN
        && let Some(term) = BLOCKLIST.iter().find(|t| lower.contains(*t))
    {
        return Err(Rejection::ErrorPhrase(term));
    }

    Ok(text.to_owned())
}

/// Whether a piece of text (e.g. a stream chunk) carries an HTML marker.
pub fn is_markup(text: &str) -> bool {
    contains_markup(&text.to_lowercase())
}

fn contains_markup(lower: &str) -> bool {
    MARKUP_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate(""), Err(Rejection::Empty));
        assert_eq!(validate("   "), Err(Rejection::Empty));
        assert_eq!(validate("\n\t"), Err(Rejection::Empty));
    }

    #[test]
    fn rejects_html_page() {
        assert_eq!(
            validate("<html><body>blocked</body></html>"),
            Err(Rejection::Markup)
        );
        assert_eq!(
            validate("<!DOCTYPE html>\n<title>Just a moment...</title>"),
            Err(Rejection::Markup)
        );
    }

    #[test]
    fn markup_check_is_case_insensitive() {
        let long = format!("{} <HTML lang=\"en\">", "x".repeat(300));
        assert_eq!(validate(&long), Err(Rejection::Markup));
    }

    #[test]
    fn accepts_normal_answer() {
        assert_eq!(
            validate("This is a normal helpful answer without markup."),
            Ok("This is a normal helpful answer without markup.".into())
        );
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(validate("err"), Err(Rejection::TooShort(3)));
        assert_eq!(validate("  ok  "), Err(Rejection::TooShort(2)));
    }

    #[test]
    fn rejects_short_error_phrase() {
        assert_eq!(
            validate("Error: provider unavailable"),
            Err(Rejection::ErrorPhrase("error"))
        );
        assert_eq!(
            validate("Request FORBIDDEN by upstream"),
            Err(Rejection::ErrorPhrase("forbidden"))
        );
    }

    #[test]
    fn accepts_long_prose_mentioning_error() {
        let answer = "When the compiler reports an error about a borrowed value, it means \
                      a reference outlives the data it points to. Restructure the code so \
                      the owner lives long enough, or clone the value if that is cheap.";
        assert!(answer.len() >= 150);
        let accepted = validate(answer).unwrap();
        assert_eq!(accepted, answer);
    }

    #[test]
    fn accepts_and_trims() {
        assert_eq!(
            validate("  Paris is the capital of France.\n"),
            Ok("Paris is the capital of France.".into())
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 9 Cyrillic characters, 18 bytes.
        assert_eq!(validate("ПриветМир"), Err(Rejection::TooShort(9)));
        assert!(validate("Привет, мир!").is_ok());
    }

    #[test]
    fn is_markup_detects_chunks() {
        assert!(is_markup("<!doctype html>"));
        assert!(is_markup("...<Html>"));
        assert!(!is_markup("use a <div> tag"));
    }

    #[test]
    fn rejection_display() {
        assert_eq!(Rejection::TooShort(3).to_string(), "response too short (3 chars)");
        assert_eq!(Rejection::Markup.to_string(), "markup in response");
    }
}
