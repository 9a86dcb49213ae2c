// Windowed context enumeration: every length-w window of every represented
// haplotype, visited exactly once, alternate branches before the reference
// continuation. The reference path emits plain reference windows; passing a
// variant's low breakend opens a branch whose journal applies the variant,
// and only windows overlapping the branch's root variant are emitted there.
// A window's coverage intersects the applied rows and subtracts every
// unapplied row whose reference extent intersects the window span, so a
// variant stops masking a window as soon as the window no longer touches
// it.

use crate::coverage::Coverage;
use crate::journal::Journal;
use crate::store::RcmsStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub sequence: Vec<u8>,
    pub coverage: Coverage,
}

pub struct ContextEnumerator<'s> {
    store: &'s RcmsStore,
    window: usize,
}

impl<'s> ContextEnumerator<'s> {
    pub fn new(store: &'s RcmsStore, window: usize) -> Self {
        assert!(window > 0, "window must be positive");
        ContextEnumerator { store, window }
    }

    pub fn enumerate(&self, mut emit: impl FnMut(Context)) {
        let source = self.store.source();
        let rows = self.store.rows();
        let w = self.window;
        let mut next_row = 0usize;

        for pos in 0..=source.len() {
            while next_row < rows.len() && rows[next_row].variant.lo() as usize == pos {
                self.open_branch(next_row, &mut emit);
                next_row += 1;
            }
            if pos == source.len() {
                break;
            }
            let end = pos + 1;
            if end >= w {
                let start = end - w;
                if let Some(coverage) = self.window_coverage(&[], Some((start, end))) {
                    emit(Context {
                        sequence: source[start..end].to_vec(),
                        coverage,
                    });
                }
            }
        }
    }

    /// Convenience for tests: all context strings in emission order.
    pub fn context_strings(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        self.enumerate(|c| out.push(c.sequence));
        out
    }

    fn open_branch(&self, root: usize, emit: &mut impl FnMut(Context)) {
        let v = &self.store.rows()[root].variant;
        let junction = v.lo() as usize;
        let junction_end = junction + v.alt.len();
        // nothing can start before the sequence begin, so a deletion there
        // has no straddling window
        if junction_end == 0 {
            return;
        }
        let mut journal = Journal::new(self.store.source());
        journal.record_delete(junction, v.span() as usize);
        journal.record_insert(junction, &v.alt);
        let mut applied = vec![root as u32];
        self.walk_branch(
            &mut journal,
            &mut applied,
            junction_end,
            junction,
            root + 1,
            emit,
        );
    }

    /// Consumes journal symbols from `cursor` on, opening nested branches
    /// alternate-first, until no window can overlap the root's region
    /// `[.., root_jend)` any more.
    fn walk_branch(
        &self,
        journal: &mut Journal,
        applied: &mut Vec<u32>,
        root_jend: usize,
        mut cursor: usize,
        mut next_row: usize,
        emit: &mut impl FnMut(Context),
    ) {
        let rows = self.store.rows();
        let w = self.window;
        while cursor < journal.len() && cursor + 1 < root_jend + w {
            // branch into every variant anchored at the next symbol
            if let Some((anchor, _)) = journal.anchor_span(cursor, cursor + 1) {
                while next_row < rows.len() && (rows[next_row].variant.lo() as usize) < anchor {
                    next_row += 1;
                }
                let mut candidate = next_row;
                while candidate < rows.len()
                    && rows[candidate].variant.lo() as usize == anchor
                {
                    if self.branchable(applied, candidate) {
                        let u = &rows[candidate].variant;
                        let snap = journal.snapshot();
                        journal.record_delete(cursor, u.span() as usize);
                        journal.record_insert(cursor, &u.alt);
                        applied.push(candidate as u32);
                        self.walk_branch(
                            journal,
                            applied,
                            root_jend,
                            cursor,
                            candidate + 1,
                            emit,
                        );
                        applied.pop();
                        journal.restore(&snap);
                    }
                    candidate += 1;
                }
                next_row = candidate;
            }

            cursor += 1;
            if cursor >= w {
                let start = cursor - w;
                if start < root_jend {
                    let span = journal.anchor_span(start, cursor);
                    if let Some(coverage) = self.window_coverage(applied, span) {
                        let mut sequence = Vec::with_capacity(w);
                        journal.extract(start..cursor, &mut sequence);
                        emit(Context { sequence, coverage });
                    }
                }
            }
        }
    }

    /// Same-point insertions stay mutually exclusive siblings; everything
    /// else anchored in reach may stack. Dead combinations are cut early.
    fn branchable(&self, applied: &[u32], candidate: usize) -> bool {
        let rows = self.store.rows();
        let u = &rows[candidate].variant;
        if let Some(&last) = applied.last() {
            let prev = &rows[last as usize].variant;
            if prev.is_insertion() && u.is_insertion() && prev.lo() == u.lo() {
                return false;
            }
        }
        applied
            .iter()
            .all(|&a| rows[a as usize].coverage.and(&rows[candidate].coverage)
                .map(|c| c.any())
                .unwrap_or(false))
    }

    /// Coverage of a window touching the given anchor extent on the path
    /// `applied`, or `None` when no haplotype realises it. A window made of
    /// inserted symbols only touches no anchor and masks nothing.
    fn window_coverage(
        &self,
        applied: &[u32],
        anchor_span: Option<(usize, usize)>,
    ) -> Option<Coverage> {
        let rows = self.store.rows();
        let mut coverage = Coverage::full(self.store.haplotypes());
        for &a in applied {
            coverage
                .intersect(&rows[a as usize].coverage)
                .expect("store rows share one coverage domain");
        }
        if let Some((span_lo, span_hi)) = anchor_span {
            for t in self.store.rows_overlapping(span_lo as u32, span_hi as u32) {
                if !applied.contains(&(t as u32)) {
                    coverage
                        .difference(&rows[t].coverage)
                        .expect("store rows share one coverage domain");
                }
            }
        }
        Some(coverage).filter(Coverage::any)
    }
}
