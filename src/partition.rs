//! Reduce bucket selection.
//!
//! Word-outcome keys are routed by their word alone, so every outcome and
//! theme recorded for one word lands on the same reducer.

use anyhow::{bail, Result};

use crate::ihash;
use crate::key::{self, CompositeKey};

/// Bucket for `key` out of `n_reduce`, looking only at the word.
pub fn partition_for(key: &CompositeKey, n_reduce: u32) -> Result<u32> {
    bucket(key.word().as_bytes(), n_reduce)
}

/// [`crate::PartitionFn`] over serialized [`CompositeKey`]s.
pub fn by_word(key: &[u8], n_reduce: u32) -> Result<u32> {
    bucket(key::word_of(key)?.as_bytes(), n_reduce)
}

fn bucket(bytes: &[u8], n_reduce: u32) -> Result<u32> {
    if n_reduce == 0 {
        bail!("partition count must be positive");
    }
    Ok(ihash(bytes) % n_reduce)
}
