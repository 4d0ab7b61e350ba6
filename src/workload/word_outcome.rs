//! Counts words per answer outcome and theme.
//!
//! Input splits hold one JSON event per line. Every surviving token becomes a
//! `(word, outcome, theme) -> 1` pair; unreadable lines are skipped.

use crate::extract::Record;
use crate::key::CompositeKey;
use crate::utils::{lines, string_from_bytes_lossy};
use crate::*;
use bytes::{BufMut, BytesMut};

pub fn map(kv: KeyValue) -> MapOutput {
    let KeyValue { key: split, value } = kv;

    // scratch buffers live as long as this split's iterator
    let mut key_buf = BytesMut::new();
    let mut value_buf = BytesMut::new();

    let iter = lines(value)
        .enumerate()
        .flat_map(move |(lineno, line)| {
            let line = string_from_bytes_lossy(&line);
            if line.trim().is_empty() {
                return Vec::new();
            }
            match Record::parse(&line) {
                Ok(record) => record.keys().collect::<Vec<_>>(),
                Err(skip) => {
                    log::debug!(
                        "Skipping {}:{} ({})",
                        String::from_utf8_lossy(&split),
                        lineno + 1,
                        skip
                    );
                    Vec::new()
                }
            }
        })
        .map(move |key: CompositeKey| {
            key.encode_into(&mut key_buf);
            value_buf.put_u64(1);

            let key = key_buf.split().freeze();
            let value = value_buf.split().freeze();

            Ok(KeyValue { key, value })
        });
    Ok(Box::new(iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::decode_count;
    use crate::key::{CompositeKey, Outcome};
    use bytes::Bytes;

    fn run_map(input: &'static str) -> Vec<(CompositeKey, u64)> {
        let kv = KeyValue::new(Bytes::from_static(b"split-0"), Bytes::from_static(input.as_bytes()));
        map(kv)
            .unwrap()
            .map(|item| {
                let KeyValue { key, value } = item.unwrap();
                (CompositeKey::from_bytes(&key).unwrap(), decode_count(value).unwrap())
            })
            .collect()
    }

    #[test]
    fn emits_one_per_token_and_skips_bad_lines() {
        let pairs = run_map(concat!(
            "{\"text\":\"Paris est la capitale\",\"theme\":\"Geo\",\"is_correct\":true}\n",
            "not-json\n",
            "\n",
            "{\"text\":\"cat cat\",\"theme\":\"t\",\"correct\":\"0\"}\r\n",
        ));
        assert_eq!(
            pairs,
            vec![
                (CompositeKey::new("paris", Outcome::Correct, "geo"), 1),
                (CompositeKey::new("capitale", Outcome::Correct, "geo"), 1),
                (CompositeKey::new("cat", Outcome::Incorrect, "t"), 1),
                (CompositeKey::new("cat", Outcome::Incorrect, "t"), 1),
            ]
        );
    }

    #[test]
    fn pairs_are_produced_as_the_split_is_read() {
        let line = "{\"text\":\"alpha beta\",\"theme\":\"t\",\"is_correct\":true}\n";
        let split = Bytes::from(line.repeat(50_000));
        let mut iter = map(KeyValue::new(Bytes::from_static(b"big"), split)).unwrap();

        let first = iter.next().unwrap().unwrap();
        assert_eq!(
            CompositeKey::from_bytes(&first.key).unwrap(),
            CompositeKey::new("alpha", Outcome::Correct, "t")
        );
        assert_eq!(iter.count(), 99_999);
    }

    #[test]
    fn empty_split_emits_nothing() {
        assert!(run_map("").is_empty());
        assert!(run_map("garbage\n[]\n{}\n").is_empty());
    }
}
