// Chunked-parallel search driver: partitions the reference, runs one
// seed-and-extend pass per chunk on the worker pool, and folds the
// thread-local match maps after the join. Chunks that fail are collected
// and reported after all of them settle; a cancellation token or deadline
// skips chunks that have not started yet and the partial result is handed
// back with a cancelled diagnostic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::matcher::SeedMatcherKind;
use crate::search::matches::{MatchAccumulator, SearchMatch};
use crate::search::verifier::{search_bucket, Bucket};
use crate::store::RcmsStore;
use crate::tree::chunk::{chunk_partitions, ChunkSpec};
use crate::tree::volatile::VolatileTree;
use crate::utils;

#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Routes needles to chunks. The interleaved-Bloom-filter prefilter plugs
/// in here; the default admits everything.
pub trait QueryFilter: Sync {
    fn admits(&self, chunk: &ChunkSpec, needle: usize) -> bool;
}

pub struct PassThroughFilter;

impl QueryFilter for PassThroughFilter {
    fn admits(&self, _chunk: &ChunkSpec, _needle: usize) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Allowed error rate per needle, `0.0..=1.0`.
    pub error_rate: f64,
    /// Chunk size override; defaults to about one chunk per worker.
    pub chunk_size: Option<usize>,
    pub deadline: Option<Instant>,
    /// Concrete matcher driving the seed phase.
    pub seed_matcher: SeedMatcherKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            error_rate: 0.0,
            chunk_size: None,
            deadline: None,
            seed_matcher: SeedMatcherKind::default(),
        }
    }
}

#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk: usize,
    pub error: Error,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub matches: HashMap<usize, Vec<SearchMatch>>,
    pub failures: Vec<ChunkFailure>,
    pub cancelled: bool,
}

pub fn run_search(
    store: &RcmsStore,
    needles: &[Vec<u8>],
    config: &SearchConfig,
    filter: &dyn QueryFilter,
    token: &CancelToken,
) -> Result<SearchOutcome> {
    if !(0.0..=1.0).contains(&config.error_rate) {
        return Err(Error::InvalidInput(format!(
            "error rate {} outside [0, 1]",
            config.error_rate
        )));
    }

    // the widest seed window any needle can produce sizes the chunk fringe
    let window = needles
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| {
            let k = (config.error_rate * n.len() as f64).floor() as usize;
            n.len() / (k.min(n.len() - 1) + 1)
        })
        .max()
        .unwrap_or(1)
        .max(1);

    // suffix extensions may run one whole needle past a seed, so the walked
    // range of every chunk overhangs its core by the longest possible match
    let overhang = needles
        .iter()
        .map(|n| {
            let k = (config.error_rate * n.len() as f64).floor() as usize;
            n.len() + k
        })
        .max()
        .unwrap_or(0);

    let workers = rayon::current_num_threads().max(1);
    let chunk_size = config
        .chunk_size
        .unwrap_or_else(|| store.source().len().div_ceil(workers).max(1));
    let chunks = chunk_partitions(store.source().len(), chunk_size, window, overhang);

    let reversed = store.reversed();
    let reversed_tree = VolatileTree::new(&reversed);

    let started = utils::realtime();
    log::info!(
        "searching {} needles over {} chunks of about {} bp",
        needles.len(),
        chunks.len(),
        chunk_size
    );

    let results: Vec<(usize, Result<MatchAccumulator>)> = chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            if token.is_cancelled()
                || config.deadline.is_some_and(|d| Instant::now() >= d)
            {
                return (index, Err(Error::Cancelled));
            }
            let bucket = Bucket {
                chunk: *chunk,
                needles: needles
                    .iter()
                    .enumerate()
                    .filter(|(i, n)| !n.is_empty() && filter.admits(chunk, *i))
                    .map(|(i, n)| (i, n.as_slice()))
                    .collect(),
            };
            let mut local = MatchAccumulator::new();
            let outcome = search_bucket(
                store,
                &reversed,
                &reversed_tree,
                &bucket,
                config.error_rate,
                config.seed_matcher,
                &mut local,
            );
            (index, outcome.map(|()| local))
        })
        .collect();

    let mut merged = MatchAccumulator::new();
    let mut failures = Vec::new();
    let mut cancelled = false;
    for (index, result) in results {
        match result {
            Ok(local) => merged.merge(local),
            Err(Error::Cancelled) => cancelled = true,
            Err(error) => failures.push(ChunkFailure { chunk: index, error }),
        }
    }

    log::info!(
        "search done: {} raw matches, {:.2}s wall, {:.2}s cpu",
        merged.len(),
        utils::realtime() - started,
        utils::cputime()
    );
    for failure in &failures {
        log::error!("chunk {} failed: {}", failure.chunk, failure.error);
    }

    Ok(SearchOutcome {
        matches: merged.finish(),
        failures,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::variant::Variant;

    #[test]
    fn cancelled_before_start_returns_partial_empty() {
        let mut store = RcmsStore::new(*b"ACGTACGTACGT", 2);
        store
            .add(Variant::snv(3, b'A'), Coverage::of(2, &[0]))
            .unwrap();
        let token = CancelToken::new();
        token.cancel();
        let outcome = run_search(
            &store,
            &[b"ACGT".to_vec()],
            &SearchConfig::default(),
            &PassThroughFilter,
            &token,
        )
        .unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.matches.values().all(Vec::is_empty) || outcome.matches.is_empty());
    }

    #[test]
    fn bad_error_rate_is_invalid_input() {
        let store = RcmsStore::new(*b"ACGT", 1);
        let config = SearchConfig {
            error_rate: 1.5,
            ..SearchConfig::default()
        };
        assert!(matches!(
            run_search(
                &store,
                &[],
                &config,
                &PassThroughFilter,
                &CancelToken::new()
            ),
            Err(Error::InvalidInput(_))
        ));
    }
}
