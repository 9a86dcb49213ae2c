// Two-phase seed-and-extend search over one bucket (a chunk's sub-tree and
// the needles routed to it). Each needle is cut into pigeonhole fragments,
// one more than its error budget, so every occurrence within the budget
// contains at least one exact fragment. Fragments are matched exactly over
// the composed tree; every seed hit is extended to the right under the full
// budget and then to the left, over the reversed store, under whatever the
// suffix left over. Both extenders explore every branch independently;
// duplicates fall out in the reducer.

use std::ops::Range;

use crate::coverage::Coverage;
use crate::error::{Error, Result};
use crate::matcher::{AnyMatcher, Matcher, MatcherStateStack, SeedMatcherKind};
use crate::search::extender::{extend, AnchoredEdit, ExtensionHit, SymbolCoord};
use crate::search::matches::{MatchAccumulator, MatchPosition, SearchMatch};
use crate::store::{RcmsStore, ReversedStore};
use crate::tree::coloured::{ColouredNode, ColouredTree};
use crate::tree::extend::LeftExtendTree;
use crate::tree::label::LabelSegment;
use crate::tree::prune::PruneTree;
use crate::tree::seek::SeekTree;
use crate::tree::trim::TrimTree;
use crate::tree::volatile::VolatileTree;
use crate::tree::{
    locate, ChunkSpec, HasCoverage, HasSeekPosition, SeekPosition, TraversalSubscriber,
    Traverser, TreeNode,
};

/// A unit of work: one chunk and the needles assigned to it.
pub struct Bucket<'a> {
    pub chunk: ChunkSpec,
    pub needles: Vec<(usize, &'a [u8])>,
}

/// Splits `len` needle symbols into `errors + 1` fragments; the last one
/// takes the remainder.
pub fn pigeonhole_fragments(len: usize, errors: usize) -> Vec<Range<usize>> {
    let count = errors + 1;
    let base = len / count;
    let mut fragments = Vec::with_capacity(count);
    for i in 0..count {
        let begin = i * base;
        let end = if i + 1 == count { len } else { begin + base };
        fragments.push(begin..end);
    }
    fragments
}

/// Per-path scan bookkeeping, kept in lockstep with the traversal: the path
/// sequence (the descent's journal), its label segments, and one seed
/// matcher per fragment with its state stack. The matcher kind is chosen by
/// the caller and dispatched per call.
struct ScanState {
    path: Vec<u8>,
    segs: Vec<(usize, LabelSegment)>,
    marks: Vec<(usize, usize)>,
    matchers: Vec<AnyMatcher>,
    stacks: Vec<MatcherStateStack<AnyMatcher>>,
}

impl ScanState {
    fn new(needle: &[u8], fragments: &[Range<usize>], seed_matcher: SeedMatcherKind) -> Self {
        let matchers: Vec<AnyMatcher> = fragments
            .iter()
            .map(|f| seed_matcher.matcher(&needle[f.clone()]))
            .collect();
        let stacks = matchers.iter().map(|_| MatcherStateStack::new()).collect();
        ScanState {
            path: Vec::new(),
            segs: Vec::new(),
            marks: Vec::new(),
            matchers,
            stacks,
        }
    }

    fn coord_at(&self, path_pos: usize) -> SymbolCoord {
        let idx = self
            .segs
            .partition_point(|&(start, _)| start <= path_pos)
            .saturating_sub(1);
        let (start, seg) = self.segs[idx];
        let offset = (path_pos - start) as u32;
        match seg {
            LabelSegment::Source { begin, .. } => SymbolCoord::Source(begin + offset),
            LabelSegment::Alternate { variant, begin, .. } => SymbolCoord::Alt {
                row: variant,
                offset: begin + offset,
            },
        }
    }
}

impl TraversalSubscriber for ScanState {
    fn on_push(&mut self) {
        self.marks.push((self.path.len(), self.segs.len()));
        for (matcher, stack) in self.matchers.iter().zip(self.stacks.iter_mut()) {
            stack.push(matcher);
        }
    }

    fn on_pop(&mut self) {
        let (path_len, segs_len) = self
            .marks
            .pop()
            .expect("traversal popped below its own marks");
        self.path.truncate(path_len);
        self.segs.truncate(segs_len);
        for (matcher, stack) in self.matchers.iter_mut().zip(self.stacks.iter_mut()) {
            stack.pop(matcher);
        }
    }
}

pub fn search_bucket(
    store: &RcmsStore,
    reversed: &ReversedStore<'_>,
    reversed_tree: &VolatileTree<'_, ReversedStore<'_>>,
    bucket: &Bucket<'_>,
    error_rate: f64,
    seed_matcher: SeedMatcherKind,
    acc: &mut MatchAccumulator,
) -> Result<()> {
    let haplotypes = store.haplotypes();
    for &(needle_id, needle) in &bucket.needles {
        if needle.is_empty() {
            continue;
        }
        let max_errors = (error_rate * needle.len() as f64).floor() as usize;
        let frag_errors = max_errors.min(needle.len() - 1);
        let fragments = pigeonhole_fragments(needle.len(), frag_errors);
        let window = fragments.iter().map(|f| f.len()).min().unwrap_or(0);
        if window == 0 {
            log::warn!(
                "needle {} shorter than its own error budget, skipped",
                needle_id
            );
            continue;
        }

        let base = bucket.chunk.tree(store);
        let tree = SeekTree::new(PruneTree::new(ColouredTree::new(
            LeftExtendTree::new(TrimTree::new(&base, window - 1), window - 1),
            haplotypes,
        )));
        let extension = (bucket.chunk.begin as usize).min(window - 1);

        let mut scan = ScanState::new(needle, &fragments, seed_matcher);
        let mut traverser = Traverser::new(&tree);
        while let Some(node) = traverser.advance(&mut scan) {
            let label = node.label();
            let node_start = scan.path.len();
            let mut offset = node_start;
            for seg in label.segments() {
                scan.segs.push((offset, *seg));
                offset += seg.len();
            }
            label.materialize(store, &mut scan.path);

            let mut seed_hits: Vec<(usize, usize)> = Vec::new();
            for (fi, matcher) in scan.matchers.iter_mut().enumerate() {
                matcher.scan(&scan.path[node_start..], &mut |end| {
                    seed_hits.push((fi, end));
                });
            }
            for (fi, end) in seed_hits {
                verify_seed(
                    store,
                    reversed,
                    reversed_tree,
                    &base,
                    needle_id,
                    needle,
                    &fragments,
                    fi,
                    max_errors as u32,
                    node.position(),
                    node.coverage(),
                    node_start,
                    end,
                    extension,
                    &scan,
                    acc,
                )?;
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn verify_seed(
    store: &RcmsStore,
    reversed: &ReversedStore<'_>,
    reversed_tree: &VolatileTree<'_, ReversedStore<'_>>,
    base: &VolatileTree<'_, RcmsStore>,
    needle_id: usize,
    needle: &[u8],
    fragments: &[Range<usize>],
    fragment: usize,
    max_errors: u32,
    seed_position: SeekPosition,
    seed_coverage: &Coverage,
    node_start: usize,
    end: usize,
    extension: usize,
    scan: &ScanState,
    acc: &mut MatchAccumulator,
) -> Result<()> {
    let frag = &fragments[fragment];
    // seeds entirely inside the left context belong to the previous chunk
    let mut label_end = end - node_start;
    if node_start == 0 {
        if end <= extension {
            return Ok(());
        }
        label_end -= extension;
    }

    let suffix = &needle[frag.end..];
    let mut suffix_hits: Vec<ExtensionHit> = Vec::new();
    if suffix.is_empty() {
        suffix_hits.push(ExtensionHit {
            errors: 0,
            coverage: seed_coverage.clone(),
            position: Some(seed_position.clone()),
            last: None,
        });
    } else {
        let (raw, _applied) = locate(base, &seed_position).ok_or_else(|| {
            Error::InternalInvariant("seed position did not relocate".into())
        })?;
        let start = ColouredNode::attach(raw, seed_coverage.clone());
        let matcher = AnchoredEdit::new(suffix, max_errors);
        extend(
            store,
            &start,
            Some(seed_position.clone()),
            label_end,
            &matcher,
            &mut |hit| suffix_hits.push(hit),
        );
    }

    let seed_start_coord = scan.coord_at(end - frag.len());
    let prefix: Vec<u8> = needle[..frag.start].iter().rev().copied().collect();
    let source_len = store.source().len() as u32;

    for suffix_hit in suffix_hits {
        let budget = max_errors - suffix_hit.errors;
        if prefix.is_empty() {
            emit_match(
                store,
                reversed,
                needle_id,
                &suffix_hit,
                None,
                seed_start_coord,
                acc,
            );
            continue;
        }

        // root the leftward walk at the seed start, mirrored
        let (rev_node, rev_offset) = match seed_start_coord {
            SymbolCoord::Source(f) => (reversed_tree.resume_at(source_len - f), 0),
            SymbolCoord::Alt { row, offset } if offset == 0 => {
                let lo = store.rows()[row as usize].variant.lo();
                (reversed_tree.resume_at(source_len - lo), 0)
            }
            SymbolCoord::Alt { row, offset } => {
                let rev_row = reversed.reversed_index(row as usize) as u32;
                let alt_len = store.rows()[row as usize].variant.alt.len();
                (
                    reversed_tree.enter_alternate(rev_row),
                    alt_len - offset as usize,
                )
            }
        };
        let start = ColouredNode::attach(rev_node, Coverage::full(store.haplotypes()));
        let matcher = AnchoredEdit::new(&prefix, budget);
        let mut prefix_hits: Vec<ExtensionHit> = Vec::new();
        extend(reversed, &start, None, rev_offset, &matcher, &mut |hit| {
            prefix_hits.push(hit)
        });
        for prefix_hit in prefix_hits {
            emit_match(
                store,
                reversed,
                needle_id,
                &suffix_hit,
                Some(&prefix_hit),
                seed_start_coord,
                acc,
            );
        }
    }
    Ok(())
}

/// Combines one suffix hit and one optional prefix hit into a match record.
fn emit_match(
    store: &RcmsStore,
    reversed: &ReversedStore<'_>,
    needle_id: usize,
    suffix_hit: &ExtensionHit,
    prefix_hit: Option<&ExtensionHit>,
    seed_start_coord: SymbolCoord,
    acc: &mut MatchAccumulator,
) {
    let source_len = store.source().len() as u32;

    let mut coverage = suffix_hit.coverage.clone();
    if let Some(p) = prefix_hit {
        coverage
            .intersect(&p.coverage)
            .expect("store rows share one coverage domain");
    }
    if coverage.none() {
        return;
    }

    // where the match starts, in forward coordinates
    let (label_offset, start_inside) = match prefix_hit.and_then(|p| p.last) {
        Some(SymbolCoord::Source(rev_pos)) => ((source_len - 1 - rev_pos) as i64, None),
        Some(SymbolCoord::Alt { row, offset }) => {
            let fwd_row = reversed.forward_index(row as usize) as u32;
            let alt_len = store.rows()[fwd_row as usize].variant.alt.len() as u32;
            let lo = store.rows()[fwd_row as usize].variant.lo();
            (lo as i64, Some((fwd_row, alt_len - 1 - offset)))
        }
        None => match seed_start_coord {
            SymbolCoord::Source(f) => (f as i64, None),
            SymbolCoord::Alt { row, offset } => {
                (store.rows()[row as usize].variant.lo() as i64, Some((row, offset)))
            }
        },
    };

    let prefix_position = match start_inside {
        Some((row, _)) => SeekPosition::alternate(row),
        None => {
            let site = store
                .rows()
                .partition_point(|r| (r.variant.lo() as i64) < label_offset);
            SeekPosition::reference(site as u32)
        }
    };
    let suffix_position = suffix_hit
        .position
        .clone()
        .unwrap_or(SeekPosition::reference(0));
    let tree_position = SeekPosition::join(prefix_position, &suffix_position);

    let errors = suffix_hit.errors + prefix_hit.map_or(0, |p| p.errors);
    acc.push(SearchMatch {
        needle: needle_id,
        position: MatchPosition {
            tree_position,
            label_offset,
        },
        start_inside,
        errors,
        coverage,
    });
}
