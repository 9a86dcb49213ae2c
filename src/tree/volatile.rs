// The base tree: alternating reference/alternate segments derived from the
// store's breakend sites. Nodes are lightweight cursors into the site table;
// children are produced on demand and never retained. On the reference path
// the walk visits every breakend site of its range; once on an alternate
// path only the low breakends of branchable variants matter and the sink is
// never reached.

use crate::coverage::Coverage;
use crate::store::StoreRead;
use crate::tree::label::Label;
use crate::tree::{SequenceTree, TreeNode};
use crate::variant::{BreakendSide, BreakendSite};

pub struct VolatileTree<'s, S: StoreRead> {
    store: &'s S,
    sites: Vec<BreakendSite>,
    begin: u32,
    end: u32,
}

impl<'s, S: StoreRead> VolatileTree<'s, S> {
    /// Tree over the whole reference.
    pub fn new(store: &'s S) -> Self {
        Self::over(store, 0, store.source_len() as u32)
    }

    /// Sub-tree rooted at `begin` whose reference path ends at `end`;
    /// branches exactly the variants with `lo` in `[begin, end)`.
    pub fn over(store: &'s S, begin: u32, end: u32) -> Self {
        debug_assert!(begin <= end && end as usize <= store.source_len());
        let mut sites = Vec::new();
        for i in 0..store.variant_count() {
            let bp = store.breakpoint(i);
            if bp.lo < begin || bp.lo >= end {
                continue;
            }
            sites.push(BreakendSite {
                position: bp.lo,
                side: BreakendSide::Low,
                variant: i as u32,
            });
            if bp.hi <= end && !bp.is_insertion_point() {
                sites.push(BreakendSite {
                    position: bp.hi,
                    side: BreakendSide::High,
                    variant: i as u32,
                });
            }
        }
        sites.sort_by_key(|s| (s.position, s.side, s.variant));
        VolatileTree {
            store,
            sites,
            begin,
            end,
        }
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn sites(&self) -> &[BreakendSite] {
        &self.sites
    }

    fn site_position(&self, idx: usize) -> u32 {
        self.sites
            .get(idx)
            .map(|s| s.position)
            .unwrap_or(self.end)
    }

    /// First variant after applying `v` that a path resuming at `v.hi` may
    /// branch into. Insertions at the identical point stay mutually
    /// exclusive siblings of the same branch site.
    fn next_branchable_after(&self, v: u32) -> Option<u32> {
        let bp = self.store.breakpoint(v as usize);
        let v_is_insertion = bp.is_insertion_point();
        let mut i = v as usize + 1;
        while i < self.store.variant_count() {
            let cand = self.store.breakpoint(i);
            if cand.lo >= bp.hi
                && !(v_is_insertion && cand.is_insertion_point() && cand.lo == bp.lo)
            {
                return Some(i as u32);
            }
            i += 1;
        }
        None
    }

    /// First variant strictly after `v` in variant order (siblings at the
    /// same low position included), for paths that skip `v`.
    fn next_after_skip(&self, v: u32) -> Option<u32> {
        let i = v as usize + 1;
        (i < self.store.variant_count()).then_some(i as u32)
    }

    pub fn make_root(&self) -> VolatileNode<'_, 's, S> {
        let event = if self.sites.is_empty() {
            Event::End
        } else {
            Event::Site(0)
        };
        VolatileNode {
            tree: self,
            kind: NodeKind::Reference,
            low: self.begin,
            high: self.site_position(0),
            applied: None,
            event,
            on_alt_path: false,
        }
    }

    /// A continuation node resuming the walk at `pos`, branching every
    /// variant from there on. Extension walks start here; such nodes behave
    /// like alternate-path nodes and never reach the sink.
    pub fn resume_at(&self, pos: u32) -> VolatileNode<'_, 's, S> {
        let n = self.store.variant_count();
        let mut lo_i = 0usize;
        let mut hi_i = n;
        while lo_i < hi_i {
            let mid = (lo_i + hi_i) / 2;
            if self.store.breakpoint(mid).lo < pos {
                lo_i = mid + 1;
            } else {
                hi_i = mid;
            }
        }
        let next = (lo_i < n).then_some(lo_i as u32);
        let source_end = self.store.source_len() as u32;
        let (high, event) = match next {
            Some(v) => (self.store.breakpoint(v as usize).lo, Event::Branch(v)),
            None => (source_end, Event::End),
        };
        VolatileNode {
            tree: self,
            kind: NodeKind::Reference,
            low: pos,
            high: high.max(pos),
            applied: None,
            event,
            on_alt_path: true,
        }
    }

    /// Rebuilds the alternate child of `variant`'s branch node directly;
    /// the entry point of a seek descent.
    pub fn enter_alternate(&self, variant: u32) -> VolatileNode<'_, 's, S> {
        let bp = self.store.breakpoint(variant as usize);
        VolatileNode {
            tree: self,
            kind: NodeKind::Alternate,
            low: bp.lo,
            high: bp.hi,
            applied: Some(variant),
            event: match self.next_branchable_after(variant) {
                Some(v) => Event::Branch(v),
                None => Event::End,
            },
            on_alt_path: true,
        }
    }
}

impl<'t, 's, S: StoreRead> SequenceTree for &'t VolatileTree<'s, S> {
    type Node = VolatileNode<'t, 's, S>;

    fn root(&self) -> Self::Node {
        (*self).make_root()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Reference,
    Alternate,
}

/// What sits at a node's high boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    /// Reference path: index into the tree's site table.
    Site(usize),
    /// Alternate path: the next branchable variant.
    Branch(u32),
    /// Nothing further; the reference path yields the sink here.
    End,
}

pub struct VolatileNode<'t, 's, S: StoreRead> {
    tree: &'t VolatileTree<'s, S>,
    kind: NodeKind,
    low: u32,
    high: u32,
    applied: Option<u32>,
    event: Event,
    on_alt_path: bool,
}

impl<'t, 's, S: StoreRead> Clone for VolatileNode<'t, 's, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'t, 's, S: StoreRead> Copy for VolatileNode<'t, 's, S> {}

impl<'t, 's, S: StoreRead> VolatileNode<'t, 's, S> {
    /// Site table index of the event at the high boundary; identifies
    /// reference-path nodes uniquely for seeking.
    pub fn site_index(&self) -> Option<usize> {
        match self.event {
            Event::Site(s) => Some(s),
            Event::End if !self.on_alt_path => Some(self.tree.sites.len()),
            _ => None,
        }
    }

    fn alt_label_len(&self, variant: u32) -> usize {
        self.tree.store.alt_len(variant as usize)
    }

    fn continue_reference(&self, from: u32, after_skip_of: u32) -> Self {
        // Stays on the alternate path; only low breakends matter from here.
        let next = self.tree.next_after_skip(after_skip_of);
        self.reference_continuation(from, next)
    }

    fn reference_continuation(&self, from: u32, next: Option<u32>) -> Self {
        let source_end = self.tree.store.source_len() as u32;
        let (high, event) = match next {
            Some(v) => (self.tree.store.breakpoint(v as usize).lo, Event::Branch(v)),
            None => (source_end, Event::End),
        };
        VolatileNode {
            tree: self.tree,
            kind: NodeKind::Reference,
            low: from,
            high: high.max(from),
            applied: None,
            event,
            on_alt_path: true,
        }
    }
}

impl<'t, 's, S: StoreRead> TreeNode for VolatileNode<'t, 's, S> {
    fn next_alt(&self) -> Option<Self> {
        let v = self.branch_variant()?;
        let bp = self.tree.store.breakpoint(v as usize);
        Some(VolatileNode {
            tree: self.tree,
            kind: NodeKind::Alternate,
            low: bp.lo,
            high: bp.hi,
            applied: Some(v),
            event: match self.tree.next_branchable_after(v) {
                Some(n) => Event::Branch(n),
                None => Event::End,
            },
            on_alt_path: true,
        })
    }

    fn next_ref(&self) -> Option<Self> {
        match self.kind {
            NodeKind::Alternate => {
                let v = self.applied.expect("alternate node without a variant");
                let resume = self.tree.store.breakpoint(v as usize).hi;
                let next = match self.event {
                    Event::Branch(n) => Some(n),
                    _ => None,
                };
                Some(self.reference_continuation(resume, next))
            }
            NodeKind::Reference if self.on_alt_path => match self.event {
                Event::Branch(v) => Some(self.continue_reference(self.high, v)),
                _ => None, // alternate paths never reach the sink
            },
            NodeKind::Reference => match self.event {
                Event::Site(s) => {
                    let pos = self.tree.sites[s].position;
                    let next_event = if s + 1 < self.tree.sites.len() {
                        Event::Site(s + 1)
                    } else {
                        Event::End
                    };
                    Some(VolatileNode {
                        tree: self.tree,
                        kind: NodeKind::Reference,
                        low: pos,
                        high: self.tree.site_position(s + 1).min(self.tree.end),
                        applied: None,
                        event: next_event,
                        on_alt_path: false,
                    })
                }
                Event::End => {
                    if self.is_sink() {
                        None
                    } else {
                        // terminal segment -> canonical sink
                        Some(VolatileNode {
                            tree: self.tree,
                            kind: NodeKind::Reference,
                            low: self.tree.end,
                            high: self.tree.end,
                            applied: None,
                            event: Event::End,
                            on_alt_path: false,
                        })
                    }
                }
                Event::Branch(_) => None,
            },
        }
    }

    fn is_sink(&self) -> bool {
        !self.on_alt_path
            && self.low == self.tree.end
            && self.high == self.tree.end
            && matches!(self.event, Event::End)
    }

    fn on_alternate_path(&self) -> bool {
        self.on_alt_path
    }

    fn low_position(&self) -> u32 {
        self.low
    }

    fn high_position(&self) -> u32 {
        self.high
    }

    fn branch_variant(&self) -> Option<u32> {
        if self.kind != NodeKind::Reference {
            return None;
        }
        match self.event {
            Event::Site(s) => {
                let site = &self.tree.sites[s];
                (site.side == BreakendSide::Low).then_some(site.variant)
            }
            Event::Branch(v) => Some(v),
            Event::End => None,
        }
    }

    fn applied_variant(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Alternate => self.applied,
            NodeKind::Reference => None,
        }
    }

    fn label(&self) -> Label {
        match self.kind {
            NodeKind::Reference => Label::source(self.low, self.high),
            NodeKind::Alternate => {
                let v = self.applied.expect("alternate node without a variant");
                Label::alternate(v, self.alt_label_len(v))
            }
        }
    }

    fn variant_coverage(&self, variant: u32) -> &Coverage {
        self.tree.store.coverage(variant as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::store::RcmsStore;
    use crate::variant::Variant;

    fn store_with(variants: Vec<(Variant, Vec<usize>)>, source: &[u8], h: usize) -> RcmsStore {
        let mut store = RcmsStore::new(source.to_vec(), h);
        for (v, cov) in variants {
            store.insert(v, Coverage::of(h, &cov)).unwrap();
        }
        store
    }

    fn label_text(store: &RcmsStore, node: &VolatileNode<'_, '_, RcmsStore>) -> Vec<u8> {
        let mut out = Vec::new();
        node.label().materialize(store, &mut out);
        out
    }

    #[test]
    fn plain_reference_walks_to_sink() {
        let store = store_with(vec![], b"ACGT", 2);
        let tree = VolatileTree::new(&store);
        let root = tree.make_root();
        assert_eq!(label_text(&store, &root), b"ACGT".to_vec());
        assert!(root.next_alt().is_none());
        let sink = root.next_ref().unwrap();
        assert!(sink.is_sink());
        assert!(sink.next_ref().is_none());
    }

    #[test]
    fn snv_branches_and_rejoins() {
        let store = store_with(
            vec![(Variant::snv(5, b'G'), vec![1, 2])],
            b"AAAAAAA",
            4,
        );
        let tree = VolatileTree::new(&store);
        let root = tree.make_root();
        assert_eq!(label_text(&store, &root), b"AAAAA".to_vec());
        assert_eq!(root.branch_variant(), Some(0));

        let alt = root.next_alt().unwrap();
        assert_eq!(label_text(&store, &alt), b"G".to_vec());
        assert_eq!(alt.applied_variant(), Some(0));
        let alt_tail = alt.next_ref().unwrap();
        assert_eq!(label_text(&store, &alt_tail), b"A".to_vec());
        assert!(alt_tail.next_ref().is_none());

        // skip side crosses the high breakend, then runs to the end
        let skip = root.next_ref().unwrap();
        assert_eq!(label_text(&store, &skip), b"A".to_vec());
        let tail = skip.next_ref().unwrap();
        assert_eq!(label_text(&store, &tail), b"A".to_vec());
        assert!(tail.next_ref().unwrap().is_sink());
    }

    #[test]
    fn same_point_insertions_are_mutually_exclusive() {
        let store = store_with(
            vec![
                (Variant::insertion(2, *b"A"), vec![0]),
                (Variant::insertion(2, *b"B"), vec![1]),
                (Variant::snv(2, b'G'), vec![2]),
            ],
            b"TTTT",
            4,
        );
        let tree = VolatileTree::new(&store);
        let branch1 = tree.make_root();
        assert_eq!(branch1.branch_variant(), Some(0));

        // applying the first insertion must not branch into the second,
        // but the SNV at the same point stays reachable
        let ins_a = branch1.next_alt().unwrap();
        assert_eq!(ins_a.next_ref().unwrap().branch_variant(), Some(2));

        // skipping the first insertion reaches the second as a sibling
        let branch2 = branch1.next_ref().unwrap();
        assert_eq!(branch2.branch_variant(), Some(1));
        assert_eq!(branch2.next_ref().unwrap().branch_variant(), Some(2));
    }

    #[test]
    fn insertion_at_reference_end() {
        let store = store_with(vec![(Variant::insertion(4, *b"GG"), vec![0])], b"ACGT", 2);
        let tree = VolatileTree::new(&store);
        let mut node = tree.make_root();
        assert_eq!(label_text(&store, &node), b"ACGT".to_vec());
        let alt = node.next_alt().unwrap();
        assert_eq!(label_text(&store, &alt), b"GG".to_vec());
        assert!(alt.next_ref().unwrap().next_ref().is_none());
        // skipping an insertion at the reference end lands on the sink
        node = node.next_ref().unwrap();
        assert!(node.is_sink());
    }

    #[test]
    fn range_restricted_tree_ignores_outside_variants() {
        let store = store_with(
            vec![
                (Variant::snv(1, b'G'), vec![0]),
                (Variant::snv(6, b'G'), vec![1]),
            ],
            b"AAAAAAAA",
            2,
        );
        let tree = VolatileTree::over(&store, 4, 8);
        let root = tree.make_root();
        assert_eq!(root.low_position(), 4);
        assert_eq!(root.branch_variant(), Some(1));
    }
}
