//! Word / outcome / theme counting over quiz-answer events.
//!
//! Each input line is a JSON event carrying an answer `text`, a `theme` and a
//! correctness flag. The map side turns every event into a stream of
//! `(word, outcome, theme)` keys, the reduce side counts them. Jobs run on a
//! small standalone MapReduce engine that partitions by word and groups by
//! the full key.

use bytes::Bytes;
use std::hash::Hasher;

pub mod aggregate;
pub mod extract;
pub mod key;
pub mod normalize;
pub mod partition;
pub mod standalone;
pub mod stopwords;
pub mod utils;
pub mod workload;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// The output of an application map function.
///
/// There are 2 layers of [`anyhow::Result`]s here. The outer layer
/// accounts for errors that arise while creating the iterator.
/// The inner layer accounts for errors that occur during iteration.
pub type MapOutput = anyhow::Result<Box<dyn Iterator<Item = anyhow::Result<KeyValue>>>>;

/// A map function takes a key-value pair, where the key names the input
/// split and the value holds its raw bytes.
///
/// It returns an iterator that yields new key-value pairs.
pub type MapFn = fn(kv: KeyValue) -> MapOutput;

/// A reduce function takes in a key and an iterator over values for that key.
/// It returns an [`anyhow::Result`] containing a single output value.
///
/// Combiners share this signature; their output is a value that is fed back
/// into the shuffle under the same key.
pub type ReduceFn = fn(key: Bytes, values: Box<dyn Iterator<Item = Bytes> + '_>) -> anyhow::Result<Bytes>;

/// Picks the reduce bucket in `[0, n_reduce)` for a serialized key.
pub type PartitionFn = fn(key: &[u8], n_reduce: u32) -> anyhow::Result<u32>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    /// Optional local pre-aggregation run on each map split before the shuffle.
    pub combine_fn: Option<ReduceFn>,
    pub partition_fn: PartitionFn,
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyValue {
    /// The key.
    pub key: Bytes,
    /// The value.
    pub value: Bytes,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }

    /// Get the key of this key-value pair.
    ///
    /// This method is cheap, since [`Bytes`] are cheaply cloneable.
    #[inline]
    pub fn key(&self) -> Bytes {
        self.key.clone()
    }

    /// Consumes the key-value pair and returns the value.
    #[inline]
    pub fn into_value(self) -> Bytes {
        self.value
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(key);
    // masked to 31 bits, always fits
    (hasher.finish() & 0x7fffffff) as u32
}
