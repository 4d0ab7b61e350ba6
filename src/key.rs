//! The `(word, outcome, theme)` grouping key.
//!
//! Keys travel through the shuffle in an order-preserving binary form:
//!
//! ```text
//! word | 00 01 | theme | 00 01 | outcome byte ('0' or '1')
//! ```
//!
//! A `00` byte inside a field is written as `00 ff`. Comparing two encoded
//! keys byte by byte gives the same answer as [`Ord`] on [`CompositeKey`],
//! so a shuffle that sorts raw keys emits them in word, theme, outcome order.
//! The word comes first so a partitioner can read it without decoding the
//! rest of the key.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use bytes::{BufMut, Bytes, BytesMut};

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xff;
const TERMINATOR: u8 = 0x01;

/// Whether the answer that produced a token was correct.
///
/// Variants are declared in the order of their literals, so the derived
/// ordering matches comparing `"0"` with `"1"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Incorrect,
    Correct,
}

impl Outcome {
    /// The literal used in serialized keys and output lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Incorrect => "0",
            Outcome::Correct => "1",
        }
    }

    fn as_byte(self) -> u8 {
        self.as_str().as_bytes()[0]
    }

    /// Parses the `0` / `1` literal.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Outcome::Incorrect),
            "1" => Some(Outcome::Correct),
            _ => None,
        }
    }
}

impl From<bool> for Outcome {
    fn from(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grouping unit: one word, seen under one outcome, in one theme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    word: String,
    outcome: Outcome,
    theme: String,
}

impl CompositeKey {
    pub fn new(word: impl Into<String>, outcome: Outcome, theme: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            outcome,
            theme: theme.into(),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Appends the serialized key to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.word.len() + self.theme.len() + 5);
        put_field(buf, &self.word);
        put_field(buf, &self.theme);
        buf.put_u8(self.outcome.as_byte());
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Reads one key from the front of `buf`, advancing it past the key.
    pub fn decode<'a>(buf: &mut &'a [u8]) -> Result<Self> {
        let bytes: &'a [u8] = *buf;
        let (word, rest) = split_field(bytes).context("reading word")?;
        let (theme, rest) = split_field(rest).context("reading theme")?;
        let (&outcome, rest) = rest
            .split_first()
            .ok_or_else(|| anyhow!("key truncated before outcome"))?;
        let outcome = match outcome {
            b'0' => Outcome::Incorrect,
            b'1' => Outcome::Correct,
            other => bail!("invalid outcome byte {:#04x}", other),
        };
        let key = Self {
            word: word.into_owned(),
            outcome,
            theme: theme.into_owned(),
        };
        *buf = rest;
        Ok(key)
    }

    /// Decodes a key that must occupy the whole slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let key = Self::decode(&mut buf)?;
        if !buf.is_empty() {
            bail!("{} trailing bytes after key", buf.len());
        }
        Ok(key)
    }

    /// Parses the flat `word\toutcome\ttheme` form written by [`fmt::Display`].
    pub fn parse_flat(s: &str) -> Result<Self> {
        let mut fields = s.split('\t');
        let (Some(word), Some(outcome), Some(theme), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            bail!("expected 3 tab-separated fields in {:?}", s);
        };
        let outcome =
            Outcome::from_literal(outcome).ok_or_else(|| anyhow!("invalid outcome {:?}", outcome))?;
        Ok(Self::new(word, outcome, theme))
    }
}

/// Reads the word straight out of a serialized key, borrowing it unless it
/// had to be unescaped.
pub fn word_of(bytes: &[u8]) -> Result<Cow<'_, str>> {
    split_field(bytes).map(|(word, _)| word)
}

fn put_field(buf: &mut BytesMut, s: &str) {
    if s.as_bytes().contains(&ESCAPE) {
        for &b in s.as_bytes() {
            buf.put_u8(b);
            if b == ESCAPE {
                buf.put_u8(ESCAPED_NUL);
            }
        }
    } else {
        buf.put_slice(s.as_bytes());
    }
    buf.put_slice(&[ESCAPE, TERMINATOR]);
}

/// Splits one terminated field off the front of `bytes`.
fn split_field(bytes: &[u8]) -> Result<(Cow<'_, str>, &[u8])> {
    let mut start = 0;
    let mut unescaped: Option<Vec<u8>> = None;
    loop {
        let Some(offset) = bytes[start..].iter().position(|b| *b == ESCAPE) else {
            bail!("field is not terminated");
        };
        let at = start + offset;
        match bytes.get(at + 1) {
            Some(&TERMINATOR) => {
                let field = match unescaped {
                    Some(mut owned) => {
                        owned.extend_from_slice(&bytes[start..at]);
                        Cow::Owned(String::from_utf8(owned)?)
                    }
                    None => Cow::Borrowed(std::str::from_utf8(&bytes[..at])?),
                };
                return Ok((field, &bytes[at + 2..]));
            }
            Some(&ESCAPED_NUL) => {
                // keeps the NUL itself, drops the escape marker
                unescaped
                    .get_or_insert_with(Vec::new)
                    .extend_from_slice(&bytes[start..=at]);
                start = at + 2;
            }
            Some(other) => bail!("invalid escape {:#04x}", other),
            None => bail!("field truncated after escape"),
        }
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.word
            .cmp(&other.word)
            .then_with(|| self.theme.cmp(&other.theme))
            .then_with(|| self.outcome.cmp(&other.outcome))
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The flattened output key, `word\toutcome\ttheme`.
impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.word, self.outcome, self.theme)
    }
}
