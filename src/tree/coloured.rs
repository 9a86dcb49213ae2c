// Coloured tree: recomputes the live coverage at every node. At a branch
// the alternate child keeps the haplotypes carrying the variant and the
// reference child keeps the complement; everywhere else coverage flows
// through unchanged.

use crate::coverage::Coverage;
use crate::tree::label::Label;
use crate::tree::{HasCoverage, SequenceTree, TreeNode};

pub struct ColouredTree<T> {
    inner: T,
    haplotypes: usize,
}

impl<T: SequenceTree> ColouredTree<T> {
    pub fn new(inner: T, haplotypes: usize) -> Self {
        ColouredTree { inner, haplotypes }
    }
}

impl<T: SequenceTree> SequenceTree for ColouredTree<T> {
    type Node = ColouredNode<T::Node>;

    fn root(&self) -> Self::Node {
        ColouredNode {
            inner: self.inner.root(),
            coverage: Coverage::full(self.haplotypes),
        }
    }
}

#[derive(Clone)]
pub struct ColouredNode<N> {
    inner: N,
    coverage: Coverage,
}

impl<N: TreeNode> ColouredNode<N> {
    /// Wraps a relocated node with a known live coverage; extension walks
    /// resume colouring from a seeked position this way.
    pub fn attach(inner: N, coverage: Coverage) -> Self {
        ColouredNode { inner, coverage }
    }

    fn child(&self, inner: N, take_alt: bool) -> ColouredNode<N> {
        let coverage = match self.inner.branch_variant() {
            Some(v) => {
                let row = self.inner.variant_coverage(v);
                let derived = if take_alt {
                    self.coverage.and(row)
                } else {
                    self.coverage.andnot(row)
                };
                derived.expect("store rows share one coverage domain")
            }
            None => self.coverage.clone(),
        };
        ColouredNode { inner, coverage }
    }
}

impl<N: TreeNode> TreeNode for ColouredNode<N> {
    fn next_alt(&self) -> Option<Self> {
        self.inner.next_alt().map(|c| self.child(c, true))
    }

    fn next_ref(&self) -> Option<Self> {
        self.inner.next_ref().map(|c| self.child(c, false))
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

impl<N> HasCoverage for ColouredNode<N> {
    fn coverage(&self) -> &Coverage {
        &self.coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RcmsStore;
    use crate::tree::volatile::VolatileTree;
    use crate::variant::Variant;

    #[test]
    fn branch_splits_coverage() {
        let mut store = RcmsStore::new(*b"AAAAAAA", 4);
        store
            .add(Variant::snv(3, b'G'), Coverage::of(4, &[1, 2]))
            .unwrap();
        let base = VolatileTree::new(&store);
        let tree = ColouredTree::new(&base, 4);
        let root = tree.root();
        assert_eq!(root.coverage(), &Coverage::full(4));
        let alt = root.next_alt().unwrap();
        assert_eq!(alt.coverage(), &Coverage::of(4, &[1, 2]));
        let skip = root.next_ref().unwrap();
        assert_eq!(skip.coverage(), &Coverage::of(4, &[0, 3]));
        // past the branch the coverage flows through
        assert_eq!(
            skip.next_ref().unwrap().coverage(),
            &Coverage::of(4, &[0, 3])
        );
    }
}
