//! Function words that never become tokens.

use std::collections::HashSet;
use std::sync::LazyLock;

const FRENCH: &[&str] = &[
    "a", "au", "aux", "avec", "ce", "cet", "cette", "ces", "ceci", "cela", "ça", "le", "la", "les",
    "un", "une", "des", "du", "de", "d", "et", "est", "ou", "mais", "donc", "or", "ni", "car", "que", "qui",
    "quoi", "où", "quand", "comment", "pour", "par", "plus", "moins",
];

const ENGLISH: &[&str] = &[
    "the", "of", "and", "to", "in", "for", "on", "at", "by", "from", "with", "as", "an", "or", "is",
    "are", "was", "were", "be", "been", "this", "that", "these", "those", "it", "its", "if", "then",
    "else", "than", "so", "not", "no", "do", "does", "did", "can", "could", "i", "you", "he", "she",
    "we", "they", "them", "his", "her", "your", "yours", "our", "ours",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| FRENCH.iter().chain(ENGLISH).copied().collect());

/// Builds the table ahead of the first lookup, so map workers only ever read it.
pub fn init() {
    LazyLock::force(&STOPWORDS);
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}
