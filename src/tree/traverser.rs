// Depth-first traverser. At a branch the alternate child is pushed and
// visited first while the frame underneath already holds the reference
// continuation; a subscriber is told about every push and pop so that
// matcher state and journal length can be saved and restored in lockstep.
//
// For two variants sharing a history the traverser therefore visits every
// node excluding the later variant's subtree only after that subtree has
// been exhausted, and the walk ends when the reference path reaches the
// sink or the stack drains.

use crate::tree::{SequenceTree, TreeNode};

pub trait TraversalSubscriber {
    fn on_push(&mut self);
    fn on_pop(&mut self);
}

pub struct NullSubscriber;

impl TraversalSubscriber for NullSubscriber {
    fn on_push(&mut self) {}
    fn on_pop(&mut self) {}
}

pub struct Traverser<N> {
    stack: Vec<N>,
    started: bool,
}

impl<N: TreeNode> Traverser<N> {
    pub fn new<T: SequenceTree<Node = N>>(tree: &T) -> Self {
        Traverser {
            stack: vec![tree.root()],
            started: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Yields the next active node, or `None` when the walk is done.
    pub fn advance<S: TraversalSubscriber>(&mut self, subscriber: &mut S) -> Option<&N> {
        if self.started {
            self.step(subscriber)?;
        }
        self.started = true;
        loop {
            let top = self.stack.last()?;
            if top.is_sink() {
                // only the lowest frame walks the reference path to its end
                debug_assert_eq!(self.stack.len(), 1);
                self.stack.clear();
                return None;
            }
            return self.stack.last();
        }
    }

    fn step<S: TraversalSubscriber>(&mut self, subscriber: &mut S) -> Option<()> {
        loop {
            let top = self.stack.last_mut()?;
            let alt = top.next_alt();
            let reference = top.next_ref();
            match (alt, reference) {
                (Some(a), Some(r)) => {
                    *top = r;
                    subscriber.on_push();
                    self.stack.push(a);
                    return Some(());
                }
                (Some(only), None) => {
                    *top = only;
                    return Some(());
                }
                (None, Some(only)) => {
                    *top = only;
                    return Some(());
                }
                (None, None) => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        // the lowest frame dying ends the walk; it was
                        // never announced with a push
                        return None;
                    }
                    subscriber.on_pop();
                    return Some(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::store::RcmsStore;
    use crate::tree::volatile::VolatileTree;
    use crate::variant::Variant;

    struct CountingSubscriber {
        pushes: usize,
        pops: usize,
    }

    impl TraversalSubscriber for CountingSubscriber {
        fn on_push(&mut self) {
            self.pushes += 1;
        }
        fn on_pop(&mut self) {
            self.pops += 1;
        }
    }

    fn walk_labels(store: &RcmsStore) -> (Vec<Vec<u8>>, usize, usize) {
        let base = VolatileTree::new(store);
        let mut traverser = Traverser::new(&&base);
        let mut sub = CountingSubscriber { pushes: 0, pops: 0 };
        let mut labels = Vec::new();
        while let Some(node) = traverser.advance(&mut sub) {
            let mut text = Vec::new();
            node.label().materialize(store, &mut text);
            labels.push(text);
        }
        (labels, sub.pushes, sub.pops)
    }

    #[test]
    fn alternate_subtree_is_visited_first() {
        let mut store = RcmsStore::new(*b"AAAAAAA", 4);
        store
            .add(Variant::snv(5, b'G'), Coverage::of(4, &[1, 2]))
            .unwrap();
        let (labels, pushes, pops) = walk_labels(&store);
        // shared prefix, alternate + its tail, then the skip side
        assert_eq!(
            labels,
            vec![
                b"AAAAA".to_vec(),
                b"G".to_vec(),
                b"A".to_vec(),
                b"A".to_vec(),
                b"A".to_vec(),
            ]
        );
        assert_eq!(pushes, 1);
        assert_eq!(pops, 1);
    }

    #[test]
    fn empty_tree_yields_only_the_root_label() {
        let store = RcmsStore::new(*b"ACGT", 1);
        let (labels, pushes, pops) = walk_labels(&store);
        assert_eq!(labels, vec![b"ACGT".to_vec()]);
        assert_eq!(pushes, 0);
        assert_eq!(pops, 0);
    }
}
