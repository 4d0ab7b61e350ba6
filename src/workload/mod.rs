//! Converts MapReduce application names to actual application code.
//!
//! # Example
//!
//! ```
//! # use anyhow::Result;
//! use wordoutcome::workload;
//! # fn main() -> Result<()> {
//! let counter = workload::named("word-outcome")?;
//! assert!(counter.combine_fn.is_some());
//! # Ok(())
//! # }
//! ```

use crate::{aggregate, partition, Workload};
use anyhow::{bail, Result};

pub mod merge;
pub mod word_outcome;

/// Name of the workload run when none is given.
pub const DEFAULT: &str = "word-outcome";

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "word-outcome" => Some(Workload {
            map_fn: word_outcome::map,
            combine_fn: Some(aggregate::combine),
            partition_fn: partition::by_word,
            reduce_fn: aggregate::reduce,
        }),
        "merge" => Some(Workload {
            map_fn: merge::map,
            combine_fn: Some(aggregate::combine),
            partition_fn: partition::by_word,
            reduce_fn: aggregate::reduce,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found.", name),
    }
}
