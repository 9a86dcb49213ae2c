// Merge tree: collapses maximal single-child chains into one node whose
// label is the concatenation of the merged labels. Chains also run through
// branch sites one of whose sides was pruned, so every reachable
// non-terminal node of the merged tree has two children. The coverage of a
// merged node is the tightest one along the chain (its tail's).

use crate::coverage::Coverage;
use crate::tree::label::Label;
use crate::tree::{HasCoverage, SequenceTree, TreeNode};

pub struct MergeTree<T> {
    inner: T,
}

impl<T> MergeTree<T> {
    pub fn new(inner: T) -> Self {
        MergeTree { inner }
    }
}

impl<T: SequenceTree> SequenceTree for MergeTree<T> {
    type Node = MergeNode<T::Node>;

    fn root(&self) -> Self::Node {
        MergeNode::absorb(self.inner.root())
    }
}

#[derive(Clone)]
pub struct MergeNode<N> {
    tail: N,
    label: Label,
    low: u32,
    entry_applied: Option<u32>,
}

impl<N: TreeNode> MergeNode<N> {
    fn absorb(first: N) -> MergeNode<N> {
        let low = first.low_position();
        let entry_applied = first.applied_variant();
        let mut label = first.label();
        let mut tail = first;
        loop {
            let advanced = match (tail.next_alt(), tail.next_ref()) {
                (None, Some(r)) if !r.is_sink() => r,
                (Some(a), None) => a,
                _ => break,
            };
            label.extend(&advanced.label());
            tail = advanced;
        }
        MergeNode {
            tail,
            label,
            low,
            entry_applied,
        }
    }
}

impl<N: TreeNode> TreeNode for MergeNode<N> {
    fn next_alt(&self) -> Option<Self> {
        self.tail.next_alt().map(MergeNode::absorb)
    }

    fn next_ref(&self) -> Option<Self> {
        self.tail.next_ref().map(MergeNode::absorb)
    }

    fn is_sink(&self) -> bool {
        self.tail.is_sink()
    }

    fn on_alternate_path(&self) -> bool {
        self.tail.on_alternate_path()
    }

    fn low_position(&self) -> u32 {
        self.low
    }

    fn high_position(&self) -> u32 {
        self.tail.high_position()
    }

    fn branch_variant(&self) -> Option<u32> {
        self.tail.branch_variant()
    }

    fn applied_variant(&self) -> Option<u32> {
        self.entry_applied
    }

    fn label(&self) -> Label {
        self.label.clone()
    }

    fn variant_coverage(&self, variant: u32) -> &Coverage {
        self.tail.variant_coverage(variant)
    }
}

impl<N: HasCoverage> HasCoverage for MergeNode<N> {
    fn coverage(&self) -> &Coverage {
        self.tail.coverage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::store::RcmsStore;
    use crate::tree::coloured::ColouredTree;
    use crate::tree::prune::PruneTree;
    use crate::tree::volatile::VolatileTree;
    use crate::variant::Variant;

    #[test]
    fn chains_collapse_across_high_breakends() {
        let mut store = RcmsStore::new(*b"AAAAAAAA", 2);
        store
            .add(Variant::deletion(2, 4), Coverage::of(2, &[0]))
            .unwrap();
        let base = VolatileTree::new(&store);
        let tree = MergeTree::new(ColouredTree::new(&base, 2));
        let root = tree.root();
        // root keeps [0,2) only: it branches
        assert_eq!(root.label().len(), 2);
        // the skip side runs [2,4), crosses the high breakend and continues
        // to the end as one node
        let skip = root.next_ref().unwrap();
        let mut out = Vec::new();
        skip.label().materialize(&store, &mut out);
        assert_eq!(out, b"AAAAAA".to_vec());
        assert!(skip.next_ref().unwrap().is_sink());
    }

    #[test]
    fn pruned_branches_merge_through() {
        // both haplotypes carry the deletion, the skip side is dead
        let mut store = RcmsStore::new(*b"AACCAA", 2);
        store
            .add(Variant::deletion(2, 4), Coverage::full(2))
            .unwrap();
        let base = VolatileTree::new(&store);
        let tree = MergeTree::new(PruneTree::new(ColouredTree::new(&base, 2)));
        let root = tree.root();
        // [0,2) + alternate (empty) + [4,6) all collapse into the root chain
        let mut out = Vec::new();
        root.label().materialize(&store, &mut out);
        assert_eq!(out, b"AAAA".to_vec());
        assert!(root.next_ref().is_none() || root.next_ref().unwrap().is_sink());
    }
}
