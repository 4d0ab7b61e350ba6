//! Folds previously written `word\toutcome\ttheme\tcount` output back into
//! one tabulation. Lines that do not have that shape are skipped.

use crate::aggregate::encode_count;
use crate::key::CompositeKey;
use crate::utils::{lines, string_from_bytes_lossy};
use crate::*;

/// Splits an output line into its key and count.
pub fn parse_line(line: &str) -> Option<(CompositeKey, u64)> {
    let (flat_key, count) = line.rsplit_once('\t')?;
    let count = count.trim_end().parse::<u64>().ok()?;
    let key = CompositeKey::parse_flat(flat_key).ok()?;
    Some((key, count))
}

pub fn map(kv: KeyValue) -> MapOutput {
    let KeyValue { key: split, value } = kv;
    let iter = lines(value)
        .filter_map(move |line| {
            let line = string_from_bytes_lossy(&line);
            let parsed = parse_line(&line);
            if parsed.is_none() && !line.is_empty() {
                log::debug!("Skipping unreadable line in {}", String::from_utf8_lossy(&split));
            }
            parsed
        })
        .map(|(key, count)| Ok(KeyValue::new(key.to_bytes(), encode_count(count))));
    Ok(Box::new(iter))
}
