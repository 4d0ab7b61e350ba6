use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use dashmap::DashMap;
use glob::{glob, Pattern};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Job;
use crate::*;

// types related to this engine
type BucketIndex = u32;
pub type Buckets = DashMap<BucketIndex, Vec<KeyValue>>;

/// Written into the output directory once every part file is in place.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Record counts for a finished job, stored in the [`SUCCESS_MARKER`] file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job: Job,
    pub input_files: usize,
    pub input_bytes: u64,
    pub map_output_records: u64,
    /// Pairs handed to the shuffle, after local combining.
    pub shuffled_records: u64,
    pub reduce_output_records: u64,
}

#[derive(Debug, Default)]
pub struct MapCounters {
    pub input_bytes: AtomicU64,
    pub map_output_records: AtomicU64,
    pub shuffled_records: AtomicU64,
}

/// Expands the input location into the files to map.
///
/// A directory contributes every regular file directly inside it, except
/// names starting with `_` or `.`; anything else is used as a glob spec.
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let pattern = if path.is_dir() {
        // the directory name is literal, only the trailing `*` is a pattern
        format!("{}/*", Pattern::escape(input.trim_end_matches('/')))
    } else {
        input.to_string()
    };

    let mut files = Vec::new();
    for pathspec in glob(&pattern).with_context(|| format!("bad input spec `{}`", input))? {
        let pathspec = pathspec?;
        if pathspec.is_file() && !is_hidden(&pathspec) {
            files.push(pathspec);
        }
    }
    files.sort();
    if files.is_empty() {
        bail!("no input files match `{}`", input);
    }
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with('_') || name.starts_with('.'))
}

/// Creates the output directory, refusing to write into a non-empty one.
pub fn prepare_output(output: &str) -> Result<()> {
    let dir = Path::new(output);
    if dir.exists() {
        if !dir.is_dir() {
            bail!("output `{}` exists and is not a directory", output);
        }
        if fs::read_dir(dir)?.next().is_some() {
            bail!("output directory `{}` already exists and is not empty", output);
        }
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating output directory `{}`", output))
}

/// Runs `combine` over one split's pairs, grouped by key.
pub fn combine_split(combine: ReduceFn, mut kvs: Vec<KeyValue>) -> Result<Vec<KeyValue>> {
    kvs.sort_unstable_by_key(KeyValue::key);
    let mut combined = Vec::new();
    for (key, value_group) in &kvs.into_iter().chunk_by(KeyValue::key) {
        let value = combine(key.clone(), Box::new(value_group.map(KeyValue::into_value)))?;
        combined.push(KeyValue::new(key, value));
    }
    Ok(combined)
}

pub fn perform_map(job: &Job, engine: &Workload, inputs: &[PathBuf]) -> Result<(Buckets, MapCounters)> {
    let buckets = Buckets::new();
    let counters = MapCounters::default();

    inputs.par_iter().try_for_each(|pathspec| -> Result<()> {
        let buf = fs::read(pathspec).with_context(|| format!("reading {}", pathspec.display()))?;
        counters.input_bytes.fetch_add(buf.len() as u64, Ordering::Relaxed);

        // Each split is mapped as <filename, all data in file>
        let input_kv = KeyValue::new(Bytes::from(pathspec.display().to_string()), Bytes::from(buf));
        let mut emitted = Vec::new();
        for item in (engine.map_fn)(input_kv)? {
            emitted.push(item?);
        }
        counters
            .map_output_records
            .fetch_add(emitted.len() as u64, Ordering::Relaxed);

        let emitted = match engine.combine_fn {
            Some(combine) if job.combine => combine_split(combine, emitted)?,
            _ => emitted,
        };
        counters
            .shuffled_records
            .fetch_add(emitted.len() as u64, Ordering::Relaxed);
        log::trace!("{}: {} pairs to shuffle", pathspec.display(), emitted.len());

        for kv in emitted {
            let bucket_no = (engine.partition_fn)(&kv.key, job.n_reduce)?;
            buckets.entry(bucket_no).or_default().push(kv);
        }
        Ok(())
    })?;

    Ok((buckets, counters))
}

/// Sorts and groups every bucket, writing one `mr-out-{id}` file per reducer.
///
/// Returns the number of reduce outputs written.
pub fn perform_reduce(job: &Job, engine: &Workload, buckets: Buckets) -> Result<u64> {
    let output_dir = Path::new(&job.output);
    // every reducer commits a part file, even an empty one
    for reduce_id in 0..job.n_reduce {
        buckets.entry(reduce_id).or_default();
    }

    let written = AtomicU64::new(0);
    buckets.into_par_iter().try_for_each(|(reduce_id, bkt)| -> Result<()> {
        let tmp_pathspec = output_dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let result = reduce_bucket(engine, bkt, &tmp_pathspec).and_then(|n| {
            let out_pathspec = output_dir.join(format!("mr-out-{}", reduce_id));
            fs::rename(&tmp_pathspec, &out_pathspec)
                .with_context(|| format!("committing {}", out_pathspec.display()))?;
            Ok(n)
        });
        match result {
            Ok(n) => {
                written.fetch_add(n, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp_pathspec);
                Err(err.context(format!("reducer {} failed", reduce_id)))
            }
        }
    })?;

    Ok(written.into_inner())
}

fn reduce_bucket(engine: &Workload, mut bkt: Vec<KeyValue>, pathspec: &Path) -> Result<u64> {
    let mut out_file = BufWriter::new(File::create(pathspec)?);
    // keys are compared as raw bytes; workloads encode them order-preserving
    bkt.sort_unstable_by_key(KeyValue::key);
    let mut n = 0;
    for (key, value_group) in &bkt.into_iter().chunk_by(KeyValue::key) {
        let out = (engine.reduce_fn)(key, Box::new(value_group.map(KeyValue::into_value)))?;
        out_file.write_all(&out)?;
        n += 1;
    }
    out_file.flush()?;
    Ok(n)
}

/// Runs `job` end to end and commits its output.
pub fn run_job(job: &Job) -> Result<JobSummary> {
    let engine = workload::named(&job.workload)?;
    if job.n_reduce == 0 {
        bail!("at least one reducer is required");
    }
    stopwords::init();

    let inputs = resolve_inputs(&job.input)?;
    prepare_output(&job.output)?;

    log::info!(
        "Map phase: {} input files, workload `{}`, combine {}",
        inputs.len(),
        job.workload,
        if job.combine { "on" } else { "off" }
    );
    let (buckets, counters) = perform_map(job, &engine, &inputs)?;

    log::info!("Reduce phase: {} partitions", job.n_reduce);
    let reduce_output_records = perform_reduce(job, &engine, buckets)?;

    let summary = JobSummary {
        job: job.clone(),
        input_files: inputs.len(),
        input_bytes: counters.input_bytes.into_inner(),
        map_output_records: counters.map_output_records.into_inner(),
        shuffled_records: counters.shuffled_records.into_inner(),
        reduce_output_records,
    };
    let marker = Path::new(&job.output).join(SUCCESS_MARKER);
    fs::write(&marker, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("writing {}", marker.display()))?;

    log::info!(
        "Job complete: {} map outputs, {} shuffled, {} output lines",
        summary.map_output_records,
        summary.shuffled_records,
        summary.reduce_output_records
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{self, decode_count, encode_count};

    #[test]
    fn combine_split_folds_duplicate_keys() {
        let kv = |k: &'static [u8], n| KeyValue::new(Bytes::from_static(k), encode_count(n));
        let combined =
            combine_split(aggregate::combine, vec![kv(b"b", 1), kv(b"a", 2), kv(b"b", 3)]).unwrap();
        let flat: Vec<(Bytes, u64)> = combined
            .into_iter()
            .map(|kv| (kv.key(), decode_count(kv.into_value()).unwrap()))
            .collect();
        assert_eq!(
            flat,
            vec![(Bytes::from_static(b"a"), 2), (Bytes::from_static(b"b"), 4)]
        );
    }

    #[test]
    fn underscore_and_dot_files_are_not_inputs() {
        assert!(is_hidden(Path::new("out/_SUCCESS")));
        assert!(is_hidden(Path::new("out/.part.tmp")));
        assert!(!is_hidden(Path::new("out/mr-out-0")));
    }

    #[test]
    fn directory_names_are_not_glob_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("in[1]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("part-0.jsonl"), "{}\n").unwrap();
        fs::write(dir.join("_SUCCESS"), "").unwrap();

        let files = resolve_inputs(dir.to_str().unwrap()).unwrap();
        assert_eq!(files, vec![dir.join("part-0.jsonl")]);
    }
}
