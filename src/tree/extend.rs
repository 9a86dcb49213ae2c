// Left-extend tree: prepends up to `k` symbols of preceding reference
// context to the root label, so windowed matching over a sub-tree can see
// the head that precedes its first variant.

use crate::coverage::Coverage;
use crate::tree::label::{Label, LabelSegment};
use crate::tree::{HasCoverage, SequenceTree, TreeNode};

pub struct LeftExtendTree<T> {
    inner: T,
    k: u32,
}

impl<T> LeftExtendTree<T> {
    pub fn new(inner: T, k: usize) -> Self {
        LeftExtendTree { inner, k: k as u32 }
    }
}

impl<T: SequenceTree> SequenceTree for LeftExtendTree<T> {
    type Node = LeftExtendNode<T::Node>;

    fn root(&self) -> Self::Node {
        let root = self.inner.root();
        let extension = root.low_position().min(self.k);
        LeftExtendNode {
            inner: root,
            extension,
        }
    }
}

#[derive(Clone)]
pub struct LeftExtendNode<N> {
    inner: N,
    extension: u32,
}

impl<N> LeftExtendNode<N> {
    /// Symbols of context actually prepended; zero on every non-root node.
    pub fn extension(&self) -> u32 {
        self.extension
    }
}

impl<N: TreeNode> LeftExtendNode<N> {
    fn descend(child: N) -> LeftExtendNode<N> {
        LeftExtendNode {
            inner: child,
            extension: 0,
        }
    }
}

impl<N: TreeNode> TreeNode for LeftExtendNode<N> {
    fn next_alt(&self) -> Option<Self> {
        self.inner.next_alt().map(Self::descend)
    }

    fn next_ref(&self) -> Option<Self> {
        self.inner.next_ref().map(Self::descend)
    }

    fn is_sink(&self) -> bool {
        self.inner.is_sink()
    }

    fn on_alternate_path(&self) -> bool {
        self.inner.on_alternate_path()
    }

    fn low_position(&self) -> u32 {
        self.inner.low_position() - self.extension
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
        let mut label = self.inner.label();
        if self.extension > 0 {
            let low = self.inner.low_position();
            label.prepend(LabelSegment::Source {
                begin: low - self.extension,
                end: low,
            });
        }
        label
    }

    fn variant_coverage(&self, variant: u32) -> &Coverage {
        self.inner.variant_coverage(variant)
    }
}

impl<N: HasCoverage> HasCoverage for LeftExtendNode<N> {
    fn coverage(&self) -> &Coverage {
        self.inner.coverage()
    }
}
