//! Utility functions shared by workloads and the engine.

use bytes::Bytes;

/// Read an entire [`Bytes`] slice into a [`String`], replacing invalid UTF-8
/// with U+FFFD instead of failing.
pub fn string_from_bytes_lossy(buf: &Bytes) -> String {
    String::from_utf8_lossy(buf.as_ref()).into_owned()
}

/// Splits a split's contents into lines without copying them.
///
/// Lines end at `\n`, with an optional `\r` before it; the last line may be
/// unterminated. Terminators are not part of the yielded lines.
pub fn lines(mut buf: Bytes) -> impl Iterator<Item = Bytes> {
    std::iter::from_fn(move || {
        if buf.is_empty() {
            return None;
        }
        let mut line = match buf.iter().position(|b| *b == b'\n') {
            Some(nl) => buf.split_to(nl + 1).slice(..nl),
            None => std::mem::take(&mut buf),
        };
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(line)
    })
}
