// Search options assembled from the command line and the environment.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::matcher::SeedMatcherKind;
use crate::search::SearchConfig;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub store_path: PathBuf,
    pub reads_path: PathBuf,
    pub out_path: PathBuf,
    pub prefilter_path: Option<PathBuf>,
    /// Allowed error rate per read, `0.0..=1.0`.
    pub error_rate: f64,
    pub threads: usize,
    /// Chunk size override; by default about one chunk per worker.
    pub chunk_size: Option<usize>,
    pub timeout: Option<Duration>,
    /// Concrete matcher driving the seed phase.
    pub seed_matcher: SeedMatcherKind,
    /// 0 = errors only, 1 = default, 2+ = verbose.
    pub verbosity: i32,
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(Error::InvalidInput(format!(
                "error rate {} outside [0, 1]",
                self.error_rate
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidInput("thread count must be positive".into()));
        }
        check_extension(&self.store_path, &["jst"])?;
        check_extension(&self.reads_path, &["fa", "fasta"])?;
        check_extension(&self.out_path, &["sam", "bam"])?;
        if let Some(path) = &self.prefilter_path {
            check_extension(path, &["ibf"])?;
        }
        Ok(())
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            error_rate: self.error_rate,
            chunk_size: self.chunk_size,
            deadline: self.timeout.map(|t| Instant::now() + t),
            seed_matcher: self.seed_matcher,
        }
    }
}

/// Number of worker threads: explicit flag, then `OMP_NUM_THREADS`, then
/// every available core.
pub fn default_threads(flag: Option<usize>) -> usize {
    flag.or_else(|| {
        std::env::var("OMP_NUM_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
    })
    .unwrap_or_else(num_cpus::get)
    .max(1)
}

fn check_extension(path: &std::path::Path, allowed: &[&str]) -> Result<()> {
    // gzip suffixes are transparent for reads
    let name = path.to_string_lossy();
    let trimmed = name.strip_suffix(".gz").unwrap_or(&name);
    let ok = allowed
        .iter()
        .any(|ext| trimmed.ends_with(&format!(".{}", ext)));
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{}: expected one of {:?}",
            name, allowed
        )))
    }
}
