// Prune tree: drops children whose live coverage is empty. After pruning,
// every reachable node of a coloured tree represents at least one haplotype.

use crate::coverage::Coverage;
use crate::tree::label::Label;
use crate::tree::{HasCoverage, SequenceTree, TreeNode};

pub struct PruneTree<T> {
    inner: T,
}

impl<T> PruneTree<T> {
    pub fn new(inner: T) -> Self {
        PruneTree { inner }
    }
}

impl<T: SequenceTree> SequenceTree for PruneTree<T>
where
    T::Node: HasCoverage,
{
    type Node = PruneNode<T::Node>;

    fn root(&self) -> Self::Node {
        PruneNode {
            inner: self.inner.root(),
        }
    }
}

#[derive(Clone)]
pub struct PruneNode<N> {
    inner: N,
}

fn alive<N: TreeNode + HasCoverage>(child: N) -> Option<PruneNode<N>> {
    // the sink carries no coverage of its own meaning
    if child.coverage().none() && !child.is_sink() {
        None
    } else {
        Some(PruneNode { inner: child })
    }
}

impl<N: TreeNode + HasCoverage> TreeNode for PruneNode<N> {
    fn next_alt(&self) -> Option<Self> {
        self.inner.next_alt().and_then(alive)
    }

    fn next_ref(&self) -> Option<Self> {
        self.inner.next_ref().and_then(alive)
    }

    fn is_sink(&self) -> bool {
        self.inner.is_sink()
    }

    fn on_alternate_path(&self) -> bool {
        self.inner.on_alternate_path()
    }

    fn low_position(&self) -> u32 {
        self.inner.low_position()
    }

    fn high_position(&self) -> u32 {
        self.inner.high_position()
    }

    fn branch_variant(&self) -> Option<u32> {
        self.inner.branch_variant()
    }

    fn applied_variant(&self) -> Option<u32> {
        self.inner.applied_variant()
    }

    fn label(&self) -> Label {
        self.inner.label()
    }

    fn variant_coverage(&self, variant: u32) -> &Coverage {
        self.inner.variant_coverage(variant)
    }
}

impl<N: HasCoverage> HasCoverage for PruneNode<N> {
    fn coverage(&self) -> &Coverage {
        self.inner.coverage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RcmsStore;
    use crate::tree::coloured::ColouredTree;
    use crate::tree::volatile::VolatileTree;
    use crate::variant::Variant;

    #[test]
    fn dead_side_of_a_branch_disappears() {
        // every haplotype carries the variant, so the skip side is dead
        let mut store = RcmsStore::new(*b"AAAA", 2);
        store
            .add(Variant::snv(2, b'G'), Coverage::full(2))
            .unwrap();
        let base = VolatileTree::new(&store);
        let tree = PruneTree::new(ColouredTree::new(&base, 2));
        let root = tree.root();
        assert!(root.next_alt().is_some());
        assert!(root.next_ref().is_none());
    }
}
