//! Text folding and tokenization.
//!
//! Text is decomposed (NFD), stripped of combining marks, lowercased, and
//! every character outside the retained alphabet becomes a separator.
//! Decomposition has to run before the character filter, otherwise accented
//! letters outside the French set would split words in two.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::stopwords;

/// Shortest token that is ever emitted, in chars.
pub const MIN_TOKEN_CHARS: usize = 3;

const FRENCH_LETTERS: &str = "àâäéèêëîïôöùûüç";

/// Letters that survive the character filter.
pub fn is_retained(c: char) -> bool {
    c.is_ascii_alphabetic() || FRENCH_LETTERS.contains(c)
}

/// Folds `text` into space-separated lowercase words.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .chars()
        .map(|c| if is_retained(c) || c.is_whitespace() { c } else { ' ' })
        .collect()
}

/// Normalized words of `text` that are long enough and not stopwords.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|tok| tok.chars().count() >= MIN_TOKEN_CHARS && !stopwords::is_stopword(tok))
        .map(str::to_string)
        .collect()
}
