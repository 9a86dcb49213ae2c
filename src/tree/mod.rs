// The sequence tree family: a lazy DAG derived from the RCMS whose
// root-to-sink paths spell haplotype sequences. The base tree is wrapped by
// composable adaptors (coverage colouring, pruning, trimming, left
// extension, merging, seeking); a depth-first traverser drives matchers over
// the labels with push/pop state notifications.

pub mod chunk;
pub mod coloured;
pub mod enumerate;
pub mod extend;
pub mod label;
pub mod merge;
pub mod prune;
pub mod seek;
pub mod traverser;
pub mod trim;
pub mod volatile;

pub use chunk::{chunk_partitions, ChunkSpec};
pub use coloured::ColouredTree;
pub use enumerate::{Context, ContextEnumerator};
pub use extend::LeftExtendTree;
pub use label::{Label, LabelSegment};
pub use merge::MergeTree;
pub use prune::PruneTree;
pub use seek::{locate, PathDescriptor, SeekPosition, SeekTree};
pub use traverser::{NullSubscriber, TraversalSubscriber, Traverser};
pub use trim::TrimTree;
pub use volatile::VolatileTree;

use crate::coverage::Coverage;

pub trait SequenceTree {
    type Node: TreeNode;
    fn root(&self) -> Self::Node;
}

/// Capability set every tree node exposes; adaptor nodes wrap an inner node
/// and delegate whatever they do not refine.
pub trait TreeNode: Clone {
    /// Child entering the alternate of the variant at the high boundary.
    fn next_alt(&self) -> Option<Self>;
    /// Child continuing on the reference (or the next segment after an
    /// alternate).
    fn next_ref(&self) -> Option<Self>;
    /// Canonical terminal: low boundary at the end of the walked range with
    /// nothing pending.
    fn is_sink(&self) -> bool;
    fn on_alternate_path(&self) -> bool;
    fn low_position(&self) -> u32;
    fn high_position(&self) -> u32;
    /// The variant whose low breakend sits at the high boundary, when this
    /// node branches.
    fn branch_variant(&self) -> Option<u32>;
    /// The variant whose alternate sequence this node spells.
    fn applied_variant(&self) -> Option<u32>;
    fn label(&self) -> Label;
    /// Coverage of a variant row, resolved through the underlying store.
    fn variant_coverage(&self, variant: u32) -> &Coverage;
}

/// Exposed by the coloured adaptor and everything stacked above it.
pub trait HasCoverage {
    fn coverage(&self) -> &Coverage;
}

/// Exposed by the seekable adaptor.
pub trait HasSeekPosition {
    fn position(&self) -> SeekPosition;
}
