// Node labels: borrowed slice descriptors into the reference or a variant's
// alternate sequence. Merged nodes concatenate segments; trimmed nodes
// truncate them. Symbols are materialised through the store on demand so
// the same descriptors serve the forward and the reversed view.

use crate::store::StoreRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSegment {
    /// Reference symbols `[begin, end)`.
    Source { begin: u32, end: u32 },
    /// Alternate symbols `[begin, end)` of a variant row.
    Alternate { variant: u32, begin: u32, end: u32 },
}

impl LabelSegment {
    pub fn len(&self) -> usize {
        match *self {
            LabelSegment::Source { begin, end } => (end - begin) as usize,
            LabelSegment::Alternate { begin, end, .. } => (end - begin) as usize,
        }
    }

    fn truncated(&self, keep: usize) -> LabelSegment {
        match *self {
            LabelSegment::Source { begin, .. } => LabelSegment::Source {
                begin,
                end: begin + keep as u32,
            },
            LabelSegment::Alternate {
                variant, begin, ..
            } => LabelSegment::Alternate {
                variant,
                begin,
                end: begin + keep as u32,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Label {
    segments: Vec<LabelSegment>,
}

impl Label {
    pub fn empty() -> Self {
        Label::default()
    }

    pub fn source(begin: u32, end: u32) -> Self {
        debug_assert!(begin <= end);
        if begin == end {
            return Label::empty();
        }
        Label {
            segments: vec![LabelSegment::Source { begin, end }],
        }
    }

    pub fn alternate(variant: u32, len: usize) -> Self {
        if len == 0 {
            return Label::empty();
        }
        Label {
            segments: vec![LabelSegment::Alternate {
                variant,
                begin: 0,
                end: len as u32,
            }],
        }
    }

    pub fn segments(&self) -> &[LabelSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(LabelSegment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Keeps only the first `keep` symbols.
    pub fn truncate(&mut self, keep: usize) {
        let mut remaining = keep;
        let mut kept = Vec::new();
        for seg in &self.segments {
            if remaining == 0 {
                break;
            }
            let take = seg.len().min(remaining);
            kept.push(seg.truncated(take));
            remaining -= take;
        }
        self.segments = kept;
    }

    /// Prepends a segment (left extension of a root label).
    pub fn prepend(&mut self, seg: LabelSegment) {
        if seg.len() > 0 {
            self.segments.insert(0, seg);
        }
    }

    /// Appends another label (chain merging).
    pub fn extend(&mut self, other: &Label) {
        self.segments.extend_from_slice(&other.segments);
    }

    /// Appends the label's symbols to `out`.
    pub fn materialize<S: StoreRead>(&self, store: &S, out: &mut Vec<u8>) {
        for seg in &self.segments {
            match *seg {
                LabelSegment::Source { begin, end } => {
                    store.push_source(begin as usize..end as usize, out)
                }
                LabelSegment::Alternate {
                    variant,
                    begin,
                    end,
                } => store.push_alt(variant as usize, begin as usize..end as usize, out),
            }
        }
    }

    /// Reference extent `[min, max)` touched by the label, ignoring
    /// alternate segments.
    pub fn source_extent(&self) -> Option<(u32, u32)> {
        let mut lo = u32::MAX;
        let mut hi = 0;
        for seg in &self.segments {
            if let LabelSegment::Source { begin, end } = *seg {
                lo = lo.min(begin);
                hi = hi.max(end);
            }
        }
        (lo != u32::MAX).then_some((lo, hi))
    }
}
