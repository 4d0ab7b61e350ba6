use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::workload;

pub mod engine;

/// Count words per answer outcome and theme over newline-delimited JSON events.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input file, directory, or glob spec for the input files
    pub input: String,

    /// Output directory; must be missing or empty
    pub output: String,

    /// Name of the workload
    #[arg(short, long, default_value = workload::DEFAULT)]
    pub workload: String,

    /// Number of reduce partitions
    #[arg(short, long, default_value_t = 11, value_parser = clap::value_parser!(u32).range(1..))]
    pub reducers: u32,

    /// Skip local pre-aggregation of map output
    #[arg(long)]
    pub no_combine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub input: String,
    pub workload: String,
    pub output: String,
    pub n_reduce: u32,
    pub combine: bool,
}

impl Job {
    /// A default word-outcome job from `input` to `output`.
    pub fn new(input: impl ToString, output: impl ToString) -> Self {
        Self {
            input: input.to_string(),
            workload: workload::DEFAULT.to_string(),
            output: output.to_string(),
            n_reduce: 11,
            combine: true,
        }
    }
}

impl From<Args> for Job {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            workload: args.workload,
            output: args.output,
            n_reduce: args.reducers,
            combine: !args.no_combine,
        }
    }
}
