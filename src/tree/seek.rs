// Seek positions: stable path descriptors that relocate a node in O(depth).
// A reference-path node is addressed by its breakend-site index; a node on
// an alternate path by the variant entered at the branch plus one hop bit
// per step taken after the entry (alternate = 1, reference = 0).

use crate::coverage::Coverage;
use crate::store::StoreRead;
use crate::tree::label::Label;
use crate::tree::volatile::{VolatileNode, VolatileTree};
use crate::tree::{HasCoverage, HasSeekPosition, SequenceTree, TreeNode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathDescriptor {
    words: Vec<u64>,
    len: u32,
}

impl PathDescriptor {
    pub fn new() -> Self {
        PathDescriptor::default()
    }

    pub fn push(&mut self, is_alt: bool) {
        let word = (self.len / 64) as usize;
        if word == self.words.len() {
            self.words.push(0);
        }
        if is_alt {
            self.words[word] |= 1 << (self.len % 64);
        }
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.words[(i / 64) as usize] >> (i % 64) & 1 == 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeekPosition {
    /// Reference-path node, identified by its site-table index.
    Reference { site: u32 },
    /// Alternate-path node: the branch variant plus the hops taken past it.
    Alternate { variant: u32, hops: PathDescriptor },
}

impl SeekPosition {
    pub fn reference(site: u32) -> Self {
        SeekPosition::Reference { site }
    }

    pub fn alternate(variant: u32) -> Self {
        SeekPosition::Alternate {
            variant,
            hops: PathDescriptor::new(),
        }
    }

    /// Records one step taken past the entry node of an alternate path.
    pub fn next_alternate_node(&mut self, is_alt: bool) {
        match self {
            SeekPosition::Alternate { hops, .. } => hops.push(is_alt),
            SeekPosition::Reference { .. } => {
                // joining suffix hops onto a reference prefix re-roots the
                // descriptor; the caller sets the variant beforehand
                debug_assert!(false, "hop recorded on a reference position");
            }
        }
    }

    pub fn variant(&self) -> Option<u32> {
        match self {
            SeekPosition::Alternate { variant, .. } => Some(*variant),
            SeekPosition::Reference { .. } => None,
        }
    }

    /// Merges the positions of a prefix and a suffix extension into one
    /// descriptor spanning both sides of a seed: start from the prefix and
    /// replay every hop the suffix recorded past its first alternate node.
    pub fn join(prefix: SeekPosition, suffix: &SeekPosition) -> SeekPosition {
        match (prefix, suffix) {
            (p, SeekPosition::Reference { .. }) => p,
            (SeekPosition::Reference { .. }, s) => s.clone(),
            (
                SeekPosition::Alternate {
                    variant,
                    mut hops,
                },
                SeekPosition::Alternate { hops: suffix_hops, .. },
            ) => {
                for hop in suffix_hops.iter() {
                    hops.push(hop);
                }
                SeekPosition::Alternate { variant, hops }
            }
        }
    }
}

/// Relocates `position` in the base tree and reports every variant applied
/// along the located path. Returns the node together with the applied rows.
pub fn locate<'t, 's, S: StoreRead>(
    tree: &'t VolatileTree<'s, S>,
    position: &SeekPosition,
) -> Option<(VolatileNode<'t, 's, S>, Vec<u32>)> {
    match position {
        SeekPosition::Reference { site } => {
            let mut node = tree.make_root();
            while node.site_index()? < *site as usize {
                node = node.next_ref()?;
            }
            (node.site_index()? == *site as usize).then(|| (node, Vec::new()))
        }
        SeekPosition::Alternate { variant, hops } => {
            let mut applied = vec![*variant];
            let mut node = tree.enter_alternate(*variant);
            for hop in hops.iter() {
                node = if hop {
                    let next = node.next_alt()?;
                    applied.push(
                        next.applied_variant()
                            .expect("alternate hop into a reference node"),
                    );
                    next
                } else {
                    node.next_ref()?
                };
            }
            Some((node, applied))
        }
    }
}

/// Adaptor attaching a seek position to every node.
pub struct SeekTree<T> {
    inner: T,
}

impl<T> SeekTree<T> {
    pub fn new(inner: T) -> Self {
        SeekTree { inner }
    }
}

impl<T: SequenceTree> SequenceTree for SeekTree<T> {
    type Node = SeekNode<T::Node>;

    fn root(&self) -> Self::Node {
        SeekNode {
            inner: self.inner.root(),
            position: SeekPosition::reference(0),
            site_counter: 0,
        }
    }
}

#[derive(Clone)]
pub struct SeekNode<N> {
    inner: N,
    position: SeekPosition,
    /// Running count of reference-path steps, mirroring site indices.
    site_counter: u32,
}

impl<N: TreeNode> SeekNode<N> {
    fn child(&self, inner: N, took_alt: bool) -> SeekNode<N> {
        let mut site_counter = self.site_counter;
        let position = if !self.inner.on_alternate_path() && took_alt {
            SeekPosition::alternate(
                self.inner
                    .branch_variant()
                    .expect("alternate child without a branch variant"),
            )
        } else if self.inner.on_alternate_path() {
            let mut pos = self.position.clone();
            pos.next_alternate_node(took_alt);
            pos
        } else {
            site_counter += 1;
            SeekPosition::reference(site_counter)
        };
        SeekNode {
            inner,
            position,
            site_counter,
        }
    }
}

impl<N: TreeNode> TreeNode for SeekNode<N> {
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

impl<N> HasSeekPosition for SeekNode<N> {
    fn position(&self) -> SeekPosition {
        self.position.clone()
    }
}

impl<N: HasCoverage> HasCoverage for SeekNode<N> {
    fn coverage(&self) -> &Coverage {
        self.inner.coverage()
    }
}
