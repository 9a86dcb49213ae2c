// Match records and the per-needle reducer. A match identifies a node of
// the sequence tree spanning both sides of its seed plus the offset of the
// match start; the haplotypes realising it and the error count ride along
// so that writers never re-walk the tree.

use std::collections::HashMap;

use crate::coverage::Coverage;
use crate::store::RcmsStore;
use crate::tree::SeekPosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPosition {
    pub tree_position: SeekPosition,
    /// Reference coordinate of the match start; for a start inside an
    /// alternate sequence, the variant's anchor point.
    pub label_offset: i64,
}

#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub needle: usize,
    pub position: MatchPosition,
    /// Set when the match starts inside a variant's alternate sequence:
    /// the store row and the offset into its alternate.
    pub start_inside: Option<(u32, u32)>,
    pub errors: u32,
    pub coverage: Coverage,
}

impl SearchMatch {
    /// Identity under which duplicate finds collapse: same needle, same
    /// start, same haplotype set describe the same occurrence.
    fn dedup_key(&self) -> (i64, Option<(u32, u32)>, Coverage) {
        (
            self.position.label_offset,
            self.start_inside,
            self.coverage.clone(),
        )
    }
}

/// Collect-then-merge reducer: workers fill thread-local maps, the driver
/// folds them together after the join and removes duplicate finds.
#[derive(Debug, Default)]
pub struct MatchAccumulator {
    by_needle: HashMap<usize, Vec<SearchMatch>>,
}

impl MatchAccumulator {
    pub fn new() -> Self {
        MatchAccumulator::default()
    }

    pub fn push(&mut self, m: SearchMatch) {
        self.by_needle.entry(m.needle).or_default().push(m);
    }

    pub fn merge(&mut self, other: MatchAccumulator) {
        for (needle, mut matches) in other.by_needle {
            self.by_needle.entry(needle).or_default().append(&mut matches);
        }
    }

    pub fn len(&self) -> usize {
        self.by_needle.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-needle matches, duplicates removed keeping the lowest error
    /// count, ordered by start coordinate.
    pub fn finish(self) -> HashMap<usize, Vec<SearchMatch>> {
        let mut out = HashMap::with_capacity(self.by_needle.len());
        for (needle, mut matches) in self.by_needle {
            matches.sort_by(|a, b| {
                a.position
                    .label_offset
                    .cmp(&b.position.label_offset)
                    .then(a.start_inside.cmp(&b.start_inside))
                    .then(a.errors.cmp(&b.errors))
            });
            let mut kept: Vec<SearchMatch> = Vec::with_capacity(matches.len());
            for m in matches {
                let duplicate = kept
                    .last()
                    .is_some_and(|last| last.dedup_key() == m.dedup_key());
                if !duplicate {
                    kept.push(m);
                }
            }
            out.insert(needle, kept);
        }
        out
    }
}

/// Linear position of reference coordinate `coord` within haplotype `h`:
/// the coordinate shifted by the net indel offset of every variant of `h`
/// ending at or before it. `inside` marks a start within a variant's
/// alternate: that row contributes the inside offset instead.
pub fn linear_position(
    store: &RcmsStore,
    h: usize,
    coord: i64,
    inside: Option<(u32, u32)>,
) -> i64 {
    let mut pos = coord;
    for (i, row) in store.rows().iter().enumerate() {
        let v = &row.variant;
        if v.lo() as i64 > coord {
            break;
        }
        if !row.coverage.test(h) {
            continue;
        }
        if inside.is_some_and(|(r, _)| r as usize == i) {
            continue;
        }
        if (v.hi() as i64) <= coord {
            pos += v.length_offset();
        }
    }
    if let Some((_, offset)) = inside {
        pos += offset as i64;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn sample_match(offset: i64, errors: u32, coverage: Coverage) -> SearchMatch {
        SearchMatch {
            needle: 0,
            position: MatchPosition {
                tree_position: SeekPosition::reference(0),
                label_offset: offset,
            },
            start_inside: None,
            errors,
            coverage,
        }
    }

    #[test]
    fn reducer_removes_duplicates_keeping_best() {
        let mut acc = MatchAccumulator::new();
        acc.push(sample_match(5, 1, Coverage::of(2, &[0])));
        acc.push(sample_match(5, 0, Coverage::of(2, &[0])));
        acc.push(sample_match(5, 0, Coverage::of(2, &[1])));
        acc.push(sample_match(9, 0, Coverage::of(2, &[0])));
        let done = acc.finish();
        let matches = &done[&0];
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].errors, 0); // the better duplicate survived
    }

    #[test]
    fn merge_folds_thread_locals() {
        let mut a = MatchAccumulator::new();
        a.push(sample_match(1, 0, Coverage::of(2, &[0])));
        let mut b = MatchAccumulator::new();
        b.push(sample_match(2, 0, Coverage::of(2, &[1])));
        a.merge(b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn linear_positions_account_for_indels() {
        let mut store = RcmsStore::new(*b"AAAAAAAAAA", 2);
        store
            .add(Variant::deletion(2, 4), Coverage::of(2, &[0]))
            .unwrap();
        store
            .add(Variant::insertion(6, *b"GGG"), Coverage::of(2, &[0, 1]))
            .unwrap();
        // hap 0 at coordinate 8: two deleted, three inserted before it
        assert_eq!(linear_position(&store, 0, 8, None), 9);
        // hap 1 misses the deletion
        assert_eq!(linear_position(&store, 1, 8, None), 11);
        // before both variants nothing shifts
        assert_eq!(linear_position(&store, 0, 1, None), 1);
        // start three symbols into the insertion's alternate
        assert_eq!(linear_position(&store, 1, 6, Some((1, 2))), 8);
    }
}
