// Trim tree: caps how far alternate subtrees may grow. Reference-path nodes
// keep the full budget; branching off spends nothing on the variant's own
// alternate label; every further node on the alternate path pays its label
// length (nested alternate labels included). A node whose budget is spent
// is a leaf, and a label overrunning the remainder is cut short.

use crate::coverage::Coverage;
use crate::tree::label::Label;
use crate::tree::{HasCoverage, SequenceTree, TreeNode};

pub struct TrimTree<T> {
    inner: T,
    budget: i64,
}

impl<T> TrimTree<T> {
    pub fn new(inner: T, budget: usize) -> Self {
        TrimTree {
            inner,
            budget: budget as i64,
        }
    }
}

impl<T: SequenceTree> SequenceTree for TrimTree<T> {
    type Node = TrimNode<T::Node>;

    fn root(&self) -> Self::Node {
        TrimNode {
            inner: self.inner.root(),
            remaining: self.budget,
            keep: None,
        }
    }
}

#[derive(Clone)]
pub struct TrimNode<N> {
    inner: N,
    remaining: i64,
    /// Set when the label overruns the remaining budget.
    keep: Option<usize>,
}

impl<N: TreeNode> TrimNode<N> {
    fn wrap(&self, child: N, child_is_alt: bool) -> TrimNode<N> {
        if !self.inner.on_alternate_path() {
            // branching off keeps the full budget, the reference path is
            // never limited
            return TrimNode {
                inner: child,
                remaining: self.remaining,
                keep: None,
            };
        }
        let cost = if child_is_alt {
            child.label().len() as i64
        } else {
            (child.high_position() - child.low_position()) as i64
        };
        let remaining = self.remaining - cost;
        let keep = (remaining < 0).then(|| (cost + remaining).max(0) as usize);
        TrimNode {
            inner: child,
            remaining,
            keep,
        }
    }

    fn exhausted(&self) -> bool {
        self.inner.on_alternate_path() && self.remaining <= 0
    }
}

impl<N: TreeNode> TreeNode for TrimNode<N> {
    fn next_alt(&self) -> Option<Self> {
        if self.exhausted() {
            return None;
        }
        self.inner.next_alt().map(|c| self.wrap(c, true))
    }

    fn next_ref(&self) -> Option<Self> {
        if self.exhausted() {
            return None;
        }
        self.inner.next_ref().map(|c| self.wrap(c, false))
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
        match self.keep {
            Some(keep) => self.inner.low_position() + keep as u32,
            None => self.inner.high_position(),
        }
    }

    fn branch_variant(&self) -> Option<u32> {
        self.inner.branch_variant()
    }

    fn applied_variant(&self) -> Option<u32> {
        self.inner.applied_variant()
    }

    fn label(&self) -> Label {
        let mut label = self.inner.label();
        if let Some(keep) = self.keep {
            label.truncate(keep);
        }
        label
    }

    fn variant_coverage(&self, variant: u32) -> &Coverage {
        self.inner.variant_coverage(variant)
    }
}

impl<N: HasCoverage> HasCoverage for TrimNode<N> {
    fn coverage(&self) -> &Coverage {
        self.inner.coverage()
    }
}
