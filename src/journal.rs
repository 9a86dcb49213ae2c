// Journal: a lazy edit-list overlay producing a virtual sequence from an
// anchor plus recorded deltas. The journaled sequence is never materialised;
// random access binary-searches the segment table. Tree descent records
// deltas going down and restores a snapshot when a subtree pops.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Src {
    Anchor(usize),
    Patch(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    jbegin: usize,
    len: usize,
    src: Src,
}

#[derive(Debug, Clone)]
pub struct Journal<'a> {
    anchor: &'a [u8],
    patch: Vec<u8>,
    entries: Vec<Entry>,
}

/// State needed to rewind the journal to an earlier point of the descent.
#[derive(Debug, Clone)]
pub struct JournalSnapshot {
    entries: Vec<Entry>,
    patch_len: usize,
}

impl<'a> Journal<'a> {
    pub fn new(anchor: &'a [u8]) -> Self {
        let entries = if anchor.is_empty() {
            Vec::new()
        } else {
            vec![Entry {
                jbegin: 0,
                len: anchor.len(),
                src: Src::Anchor(0),
            }]
        };
        Journal {
            anchor,
            patch: Vec::new(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .last()
            .map(|e| e.jbegin + e.len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Symbol at journal position `p`.
    pub fn get(&self, p: usize) -> u8 {
        let idx = self.entry_of(p);
        let e = &self.entries[idx];
        let off = p - e.jbegin;
        match e.src {
            Src::Anchor(begin) => self.anchor[begin + off],
            Src::Patch(begin) => self.patch[begin + off],
        }
    }

    /// Copies journal range `[range.start, range.end)` into `out`.
    pub fn extract(&self, range: Range<usize>, out: &mut Vec<u8>) {
        if range.is_empty() {
            return;
        }
        let mut idx = self.entry_of(range.start);
        let mut pos = range.start;
        while pos < range.end {
            let e = &self.entries[idx];
            let take_from = pos - e.jbegin;
            let take_to = (range.end - e.jbegin).min(e.len);
            match e.src {
                Src::Anchor(begin) => {
                    out.extend_from_slice(&self.anchor[begin + take_from..begin + take_to])
                }
                Src::Patch(begin) => {
                    out.extend_from_slice(&self.patch[begin + take_from..begin + take_to])
                }
            }
            pos = e.jbegin + take_to;
            idx += 1;
        }
    }

    /// Anchor extent touched by journal range `[s, e)`: the smallest anchor
    /// interval containing every anchored symbol of the range. `None` when
    /// the range holds only patched symbols.
    pub fn anchor_span(&self, s: usize, e: usize) -> Option<(usize, usize)> {
        if s >= e || s >= self.len() {
            return None;
        }
        let e = e.min(self.len());
        let mut lo = usize::MAX;
        let mut hi = 0usize;
        let mut idx = self.entry_of(s);
        while idx < self.entries.len() && self.entries[idx].jbegin < e {
            let entry = &self.entries[idx];
            if let Src::Anchor(begin) = entry.src {
                let from = begin + s.saturating_sub(entry.jbegin);
                let to = begin + (e - entry.jbegin).min(entry.len);
                lo = lo.min(from);
                hi = hi.max(to);
            }
            idx += 1;
        }
        (lo != usize::MAX).then_some((lo, hi))
    }

    /// Records an insertion of `s` before journal position `at`.
    pub fn record_insert(&mut self, at: usize, s: &[u8]) {
        assert!(at <= self.len(), "insert past the journal end");
        if s.is_empty() {
            return;
        }
        let patch_begin = self.patch.len();
        self.patch.extend_from_slice(s);
        let idx = self.split_at(at);
        self.entries.insert(
            idx,
            Entry {
                jbegin: at,
                len: s.len(),
                src: Src::Patch(patch_begin),
            },
        );
        self.renumber_from(idx + 1);
    }

    /// Records a deletion of `n` symbols starting at journal position `at`.
    pub fn record_delete(&mut self, at: usize, n: usize) {
        assert!(at + n <= self.len(), "delete past the journal end");
        if n == 0 {
            return;
        }
        let from = self.split_at(at);
        let to = self.split_at(at + n);
        self.entries.drain(from..to);
        self.renumber_from(from);
    }

    /// Replaces `s.len()` symbols at journal position `at`.
    pub fn record_substitute(&mut self, at: usize, s: &[u8]) {
        self.record_delete(at, s.len());
        self.record_insert(at, s);
    }

    pub fn snapshot(&self) -> JournalSnapshot {
        JournalSnapshot {
            entries: self.entries.clone(),
            patch_len: self.patch.len(),
        }
    }

    pub fn restore(&mut self, snapshot: &JournalSnapshot) {
        self.entries = snapshot.entries.clone();
        self.patch.truncate(snapshot.patch_len);
    }

    fn entry_of(&self, p: usize) -> usize {
        debug_assert!(p < self.len(), "journal position {} out of range", p);
        self.entries
            .partition_point(|e| e.jbegin + e.len <= p)
    }

    /// Ensures an entry boundary at journal position `j`; returns the index
    /// of the entry starting there (or the end index).
    fn split_at(&mut self, j: usize) -> usize {
        if j == self.len() {
            return self.entries.len();
        }
        let idx = self.entry_of(j);
        let e = self.entries[idx];
        if e.jbegin == j {
            return idx;
        }
        let head_len = j - e.jbegin;
        let tail = Entry {
            jbegin: j,
            len: e.len - head_len,
            src: match e.src {
                Src::Anchor(begin) => Src::Anchor(begin + head_len),
                Src::Patch(begin) => Src::Patch(begin + head_len),
            },
        };
        self.entries[idx].len = head_len;
        self.entries.insert(idx + 1, tail);
        idx + 1
    }

    fn renumber_from(&mut self, idx: usize) {
        let mut jbegin = if idx == 0 {
            0
        } else {
            let prev = &self.entries[idx - 1];
            prev.jbegin + prev.len
        };
        for e in self.entries[idx..].iter_mut() {
            e.jbegin = jbegin;
            jbegin += e.len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(journal: &Journal) -> Vec<u8> {
        let mut out = Vec::new();
        journal.extract(0..journal.len(), &mut out);
        out
    }

    #[test]
    fn identity_without_deltas() {
        let journal = Journal::new(b"ACGTACGT");
        assert_eq!(journal.len(), 8);
        assert_eq!(journal.get(5), b'C');
        assert_eq!(collect(&journal), b"ACGTACGT".to_vec());
    }

    #[test]
    fn insert_delete_substitute() {
        let mut journal = Journal::new(b"AAAAAA");
        journal.record_insert(3, b"GG");
        assert_eq!(collect(&journal), b"AAAGGAAA".to_vec());
        assert_eq!(journal.len(), 8);

        journal.record_delete(0, 2);
        assert_eq!(collect(&journal), b"AGGAAA".to_vec());

        journal.record_substitute(4, b"TT");
        assert_eq!(collect(&journal), b"AGGATT".to_vec());
        assert_eq!(journal.get(1), b'G');
    }

    #[test]
    fn length_tracks_net_offsets() {
        let mut journal = Journal::new(b"AAAA");
        journal.record_insert(4, b"CCC");
        journal.record_delete(0, 2);
        assert_eq!(journal.len(), 4 + 3 - 2);
    }

    #[test]
    fn snapshot_restores_descent_state() {
        let mut journal = Journal::new(b"ACGTACGT");
        journal.record_delete(0, 2);
        let snap = journal.snapshot();
        journal.record_insert(1, b"TTTT");
        journal.record_delete(3, 2);
        journal.restore(&snap);
        assert_eq!(collect(&journal), b"GTACGT".to_vec());
    }

    #[test]
    fn anchor_span_skips_patched_symbols() {
        let mut journal = Journal::new(b"AAAAAAAA");
        journal.record_insert(4, b"bb"); // journal: AAAA bb AAAA
        assert_eq!(journal.anchor_span(2, 6), Some((2, 4)));
        assert_eq!(journal.anchor_span(4, 6), None);
        assert_eq!(journal.anchor_span(3, 8), Some((3, 6)));
    }

    #[test]
    fn anchor_span_bridges_deletions() {
        let mut journal = Journal::new(b"AAAAAAAA");
        journal.record_delete(3, 2); // anchor [3,5) removed
        assert_eq!(journal.anchor_span(1, 5), Some((1, 7)));
    }

    #[test]
    fn empty_anchor_with_insertions() {
        let mut journal = Journal::new(b"");
        journal.record_insert(0, b"XYZ");
        assert_eq!(collect(&journal), b"XYZ".to_vec());
        assert_eq!(journal.anchor_span(0, 3), None);
    }
}
