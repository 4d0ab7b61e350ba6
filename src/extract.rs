//! Turns one JSON event line into `(word, outcome, theme)` keys.
//!
//! Bad records never fail a job: anything that cannot be read is reported
//! as a [`Skip`] and the caller moves on to the next line.

use std::fmt;

use serde_json::{Map, Value};

use crate::key::{CompositeKey, Outcome};
use crate::normalize;

/// Theme used when a record carries none.
pub const UNKNOWN_THEME: &str = "unknown";

/// Why a line produced no keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Not valid JSON.
    Malformed,
    /// Valid JSON, but not an object.
    NotAnObject,
    /// `text` absent, empty, or not a scalar.
    MissingText,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Skip::Malformed => "malformed json",
            Skip::NotAnObject => "not a json object",
            Skip::MissingText => "missing text",
        };
        f.write_str(reason)
    }
}

/// The fields of an event that matter for counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    pub theme: String,
    pub outcome: Outcome,
}

impl Record {
    /// Reads one input line.
    pub fn parse(line: &str) -> Result<Self, Skip> {
        let value: Value = serde_json::from_str(line).map_err(|_| Skip::Malformed)?;
        let Value::Object(fields) = value else {
            return Err(Skip::NotAnObject);
        };

        let text = lowered(&fields, "text").ok_or(Skip::MissingText)?;
        let theme = lowered(&fields, "theme")
            .map(|theme| theme.replace(['\t', '\n', '\r'], " "))
            .unwrap_or_else(|| UNKNOWN_THEME.to_string());

        Ok(Self {
            text,
            theme,
            outcome: outcome_of(&fields),
        })
    }

    /// One key per surviving token, in text order.
    pub fn keys(&self) -> impl Iterator<Item = CompositeKey> + '_ {
        normalize::tokens(&self.text)
            .into_iter()
            .map(move |word| CompositeKey::new(word, self.outcome, self.theme.as_str()))
    }
}

/// All keys emitted for `line`; empty when the line is skipped.
pub fn extract(line: &str) -> Vec<CompositeKey> {
    match Record::parse(line) {
        Ok(record) => record.keys().collect(),
        Err(_) => Vec::new(),
    }
}

/// `is_correct` wins when it is a boolean; otherwise `correct` is read as a
/// string flag. Anything else counts as incorrect.
fn outcome_of(fields: &Map<String, Value>) -> Outcome {
    if let Some(Value::Bool(correct)) = fields.get("is_correct") {
        return Outcome::from(*correct);
    }
    match fields.get("correct") {
        Some(Value::String(flag)) => {
            let flag = flag.trim();
            Outcome::from(flag == "1" || flag.eq_ignore_ascii_case("true"))
        }
        _ => Outcome::Incorrect,
    }
}

/// Lowercased text of a scalar field, `None` when absent or empty.
fn lowered(fields: &Map<String, Value>, name: &str) -> Option<String> {
    let text = match fields.get(name)? {
        Value::String(s) => s.to_lowercase(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(line: &str) -> Vec<String> {
        extract(line).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn basic_correct_answer() {
        assert_eq!(
            flat(r#"{"text":"Paris est la capitale","theme":"Geo","is_correct":true}"#),
            vec!["paris\t1\tgeo", "capitale\t1\tgeo"]
        );
    }

    #[test]
    fn accents_fold_in_text_but_not_theme() {
        assert_eq!(
            flat(r#"{"text":"Élève étudie","theme":"Édu","is_correct":false}"#),
            vec!["eleve\t0\tédu", "etudie\t0\tédu"]
        );
    }

    #[test]
    fn correct_string_is_the_fallback() {
        assert_eq!(
            flat(r#"{"text":"Alpha beta","theme":"x","correct":"1"}"#),
            vec!["alpha\t1\tx", "beta\t1\tx"]
        );
        for flag in ["true", "TRUE", "True", " 1 "] {
            let line = format!(r#"{{"text":"alpha","correct":"{}"}}"#, flag);
            assert_eq!(Record::parse(&line).unwrap().outcome, Outcome::Correct, "{}", flag);
        }
        for flag in ["0", "yes", "false", ""] {
            let line = format!(r#"{{"text":"alpha","correct":"{}"}}"#, flag);
            assert_eq!(Record::parse(&line).unwrap().outcome, Outcome::Incorrect, "{}", flag);
        }
    }

    #[test]
    fn is_correct_must_be_a_boolean_to_count() {
        let parse = |line: &str| Record::parse(line).unwrap().outcome;
        assert_eq!(parse(r#"{"text":"x","is_correct":false,"correct":"1"}"#), Outcome::Incorrect);
        assert_eq!(parse(r#"{"text":"x","is_correct":"yes","correct":"1"}"#), Outcome::Correct);
        assert_eq!(parse(r#"{"text":"x","is_correct":1}"#), Outcome::Incorrect);
        assert_eq!(parse(r#"{"text":"x","correct":1}"#), Outcome::Incorrect);
        assert_eq!(parse(r#"{"text":"x"}"#), Outcome::Incorrect);
    }

    #[test]
    fn missing_or_empty_theme_is_unknown() {
        assert_eq!(
            flat(r#"{"text":"Gamma delta","is_correct":true}"#),
            vec!["gamma\t1\tunknown", "delta\t1\tunknown"]
        );
        assert_eq!(
            Record::parse(r#"{"text":"gamma","theme":""}"#).unwrap().theme,
            UNKNOWN_THEME
        );
        assert_eq!(
            Record::parse(r#"{"text":"gamma","theme":null}"#).unwrap().theme,
            UNKNOWN_THEME
        );
    }

    #[test]
    fn theme_separators_cannot_break_output_lines() {
        let record = Record::parse(r#"{"text":"gamma","theme":"A\tB\nC"}"#).unwrap();
        assert_eq!(record.theme, "a b c");
    }

    #[test]
    fn scalar_fields_are_read_as_text() {
        let record = Record::parse(r#"{"text":"Gamma","theme":42}"#).unwrap();
        assert_eq!(record.theme, "42");
        assert_eq!(Record::parse(r#"{"text":12345}"#).unwrap().text, "12345");
    }

    #[test]
    fn unreadable_lines_are_classified() {
        assert_eq!(Record::parse("not-json"), Err(Skip::Malformed));
        assert_eq!(Record::parse(r#"{"text":"open"#), Err(Skip::Malformed));
        assert_eq!(Record::parse(r#"["Alpha beta"]"#), Err(Skip::NotAnObject));
        assert_eq!(Record::parse(r#""Alpha beta""#), Err(Skip::NotAnObject));
        assert_eq!(Record::parse(r#"{"theme":"x"}"#), Err(Skip::MissingText));
        assert_eq!(Record::parse(r#"{"text":""}"#), Err(Skip::MissingText));
        assert_eq!(Record::parse(r#"{"text":["a"]}"#), Err(Skip::MissingText));
        assert!(extract("not-json").is_empty());
    }

    #[test]
    fn repeated_words_emit_once_per_occurrence() {
        assert_eq!(
            flat(r#"{"text":"cat cat","theme":"t","is_correct":true}"#),
            vec!["cat\t1\tt", "cat\t1\tt"]
        );
    }
}
