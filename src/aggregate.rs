//! Per-key count summation, shared by the combiner and the reducer.
//!
//! Counts travel as 8-byte big-endian integers. Summation is order
//! independent, so the same code runs on a map split before the shuffle and
//! on fully grouped data after it.

use anyhow::{anyhow, bail, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::key::CompositeKey;

pub fn encode_count(count: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u64(count);
    buf.freeze()
}

pub fn decode_count(mut value: Bytes) -> Result<u64> {
    if value.len() != 8 {
        bail!("count value must be 8 bytes, got {}", value.len());
    }
    Ok(value.get_u64())
}

/// Sums counts, failing on overflow instead of wrapping.
pub fn sum_counts(counts: impl IntoIterator<Item = u64>) -> Result<u64> {
    counts.into_iter().try_fold(0u64, |acc, n| {
        acc.checked_add(n).ok_or_else(|| anyhow!("count overflow"))
    })
}

/// Flattened output key and total for one composite key.
pub fn aggregate(key: &CompositeKey, counts: impl IntoIterator<Item = u64>) -> Result<(String, u64)> {
    Ok((key.to_string(), sum_counts(counts)?))
}

fn decode_all(values: Box<dyn Iterator<Item = Bytes> + '_>) -> Result<Vec<u64>> {
    values.map(decode_count).collect()
}

/// Combiner: folds partial counts into one partial count for the same key.
pub fn combine(_key: Bytes, values: Box<dyn Iterator<Item = Bytes> + '_>) -> Result<Bytes> {
    Ok(encode_count(sum_counts(decode_all(values)?)?))
}

/// Reducer: one `word\toutcome\ttheme\tcount` line per key.
pub fn reduce(key: Bytes, values: Box<dyn Iterator<Item = Bytes> + '_>) -> Result<Bytes> {
    let key = CompositeKey::from_bytes(&key)?;
    let (flat, total) = aggregate(&key, decode_all(values)?)?;
    Ok(Bytes::from(format!("{}\t{}\n", flat, total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Outcome;

    fn counts(ns: &[u64]) -> Box<dyn Iterator<Item = Bytes> + 'static> {
        Box::new(ns.to_vec().into_iter().map(encode_count))
    }

    #[test]
    fn reduce_writes_one_flat_line() {
        let key = CompositeKey::new("cat", Outcome::Correct, "t");
        let out = reduce(key.to_bytes(), counts(&[1, 1, 1])).unwrap();
        assert_eq!(&out[..], b"cat\t1\tt\t3\n");
    }

    #[test]
    fn aggregate_flattens_the_key() {
        let key = CompositeKey::new("paris", Outcome::Incorrect, "geo");
        assert_eq!(aggregate(&key, [2, 5]).unwrap(), ("paris\t0\tgeo".to_string(), 7));
        assert_eq!(aggregate(&key, Vec::new()).unwrap().1, 0);
    }

    #[test]
    fn combining_first_does_not_change_totals() {
        let key = CompositeKey::new("alpha", Outcome::Correct, "x").to_bytes();
        let direct = reduce(key.clone(), counts(&[1, 1, 1, 1, 1])).unwrap();

        let left = combine(key.clone(), counts(&[1, 1])).unwrap();
        let right = combine(key.clone(), counts(&[1, 1, 1])).unwrap();
        let staged = reduce(key, Box::new(vec![right, left].into_iter())).unwrap();

        assert_eq!(direct, staged);
    }

    #[test]
    fn bad_values_and_overflow_are_errors() {
        let key = CompositeKey::new("cat", Outcome::Correct, "t").to_bytes();
        let short = Box::new(vec![Bytes::from_static(b"\x01")].into_iter());
        assert!(combine(key.clone(), short).is_err());
        assert!(combine(key.clone(), counts(&[u64::MAX, 1])).is_err());
        assert!(reduce(Bytes::from_static(b"junk"), counts(&[1])).is_err());
        assert!(sum_counts([u64::MAX, 1]).is_err());
    }
}
