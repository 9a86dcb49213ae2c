// Seed extension: walks a sub-tree from a seed boundary while an anchored
// bounded-error matcher consumes the labels. Suffix extension runs on the
// forward tree from the seed end; prefix extension runs on the reversed
// store's tree from the seed start. Every branch is explored independently
// and a path dies as soon as its error column exceeds the budget.

use crate::coverage::Coverage;
use crate::store::StoreRead;
use crate::tree::label::LabelSegment;
use crate::tree::{HasCoverage, SeekPosition, TreeNode};

/// Anchored edit-distance matcher: one dynamic-programming column of the
/// pattern against the consumed stream prefix, alignment pinned to the
/// stream start. With a budget of zero it degenerates to exact comparison.
#[derive(Clone)]
pub struct AnchoredEdit {
    pattern: Vec<u8>,
    max_errors: u32,
    column: Vec<u32>,
    consumed: usize,
}

impl AnchoredEdit {
    pub fn new(pattern: &[u8], max_errors: u32) -> Self {
        AnchoredEdit {
            pattern: pattern.to_vec(),
            max_errors,
            column: (0..=pattern.len() as u32).collect(),
            consumed: 0,
        }
    }

    pub fn advance(&mut self, c: u8) {
        self.consumed += 1;
        let mut diagonal = self.column[0];
        self.column[0] = self.consumed as u32;
        for i in 1..self.column.len() {
            let sub = diagonal + u32::from(self.pattern[i - 1] != c);
            diagonal = self.column[i];
            self.column[i] = sub
                .min(diagonal + 1)
                .min(self.column[i - 1] + 1);
        }
    }

    /// Edits of the whole pattern against the consumed prefix.
    pub fn distance(&self) -> u32 {
        *self.column.last().expect("column never empty")
    }

    /// False once no continuation can come back under the budget.
    pub fn viable(&self) -> bool {
        self.column.iter().min().copied().unwrap_or(0) <= self.max_errors
    }

    pub fn can_consume(&self) -> bool {
        self.remaining_capacity() > 0
    }

    /// Symbols the matcher may still consume before no hit can end.
    pub fn remaining_capacity(&self) -> usize {
        (self.pattern.len() + self.max_errors as usize).saturating_sub(self.consumed)
    }

    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }
}

/// Where a consumed symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolCoord {
    Source(u32),
    Alt { row: u32, offset: u32 },
}

#[derive(Debug, Clone)]
pub struct ExtensionHit {
    pub errors: u32,
    pub coverage: Coverage,
    /// Descriptor of the hit node when the walk tracks one (suffix side).
    pub position: Option<SeekPosition>,
    /// Origin of the last consumed symbol; `None` for an empty extension.
    pub last: Option<SymbolCoord>,
}

/// Drives `matcher` over the sub-tree hanging off `node`, starting
/// `label_from` symbols into its label. Reaching the walked range's end
/// before the pattern is consumed fails silently.
pub fn extend<S: StoreRead, N: TreeNode + HasCoverage>(
    store: &S,
    node: &N,
    position: Option<SeekPosition>,
    label_from: usize,
    matcher: &AnchoredEdit,
    on_hit: &mut dyn FnMut(ExtensionHit),
) {
    let mut matcher = matcher.clone();
    // a pattern no longer than the budget aligns against nothing at all
    if matcher.distance() <= matcher.max_errors() {
        on_hit(ExtensionHit {
            errors: matcher.distance(),
            coverage: node.coverage().clone(),
            position: position.clone(),
            last: None,
        });
    }
    let mut last = None;
    if !consume_label(store, node, label_from, &mut matcher, &mut last, &position, on_hit) {
        return;
    }
    descend(store, node, &position, &matcher, on_hit);
}

fn descend<S: StoreRead, N: TreeNode + HasCoverage>(
    store: &S,
    parent: &N,
    position: &Option<SeekPosition>,
    matcher: &AnchoredEdit,
    on_hit: &mut dyn FnMut(ExtensionHit),
) {
    if !matcher.can_consume() {
        return;
    }
    for (child, took_alt) in [(parent.next_alt(), true), (parent.next_ref(), false)] {
        let Some(child) = child else { continue };
        if child.is_sink() {
            continue;
        }
        let child_position = position.as_ref().map(|p| step_position(p, parent, took_alt));
        let mut child_matcher = matcher.clone();
        let mut last = None;
        if consume_label(
            store,
            &child,
            0,
            &mut child_matcher,
            &mut last,
            &child_position,
            on_hit,
        ) {
            descend(store, &child, &child_position, &child_matcher, on_hit);
        }
    }
}

/// Feeds a node's label from `from` on; returns false when the path died.
fn consume_label<S: StoreRead, N: TreeNode + HasCoverage>(
    store: &S,
    node: &N,
    from: usize,
    matcher: &mut AnchoredEdit,
    last: &mut Option<SymbolCoord>,
    position: &Option<SeekPosition>,
    on_hit: &mut dyn FnMut(ExtensionHit),
) -> bool {
    let label = node.label();
    let mut skip = from;
    let mut buf = Vec::new();
    for seg in label.segments() {
        let seg_len = seg.len();
        if skip >= seg_len {
            skip -= seg_len;
            continue;
        }
        buf.clear();
        // never copy more label than the matcher can still consume
        let take = (seg_len - skip).min(matcher.remaining_capacity());
        let (base_coord, row) = match *seg {
            LabelSegment::Source { begin, .. } => {
                let from = begin as usize + skip;
                store.push_source(from..from + take, &mut buf);
                (begin + skip as u32, None)
            }
            LabelSegment::Alternate { variant, begin, .. } => {
                let from = begin as usize + skip;
                store.push_alt(variant as usize, from..from + take, &mut buf);
                (begin + skip as u32, Some(variant))
            }
        };
        for (i, &sym) in buf.iter().enumerate() {
            if !matcher.can_consume() {
                return false;
            }
            matcher.advance(sym);
            let coord = match row {
                None => SymbolCoord::Source(base_coord + i as u32),
                Some(r) => SymbolCoord::Alt {
                    row: r,
                    offset: base_coord + i as u32,
                },
            };
            *last = Some(coord);
            if matcher.distance() <= matcher.max_errors() {
                on_hit(ExtensionHit {
                    errors: matcher.distance(),
                    coverage: node.coverage().clone(),
                    position: position.clone(),
                    last: *last,
                });
            }
            if !matcher.viable() {
                return false;
            }
        }
        skip = 0;
    }
    true
}

fn step_position<N: TreeNode>(parent_pos: &SeekPosition, parent: &N, took_alt: bool) -> SeekPosition {
    if parent.on_alternate_path() {
        let mut pos = parent_pos.clone();
        pos.next_alternate_node(took_alt);
        pos
    } else if took_alt {
        SeekPosition::alternate(
            parent
                .branch_variant()
                .expect("alternate child without a branch variant"),
        )
    } else {
        match parent_pos {
            SeekPosition::Reference { site } => SeekPosition::reference(site + 1),
            alt => alt.clone(),
        }
    }
}
