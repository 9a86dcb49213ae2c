// Online pattern matchers. A matcher consumes haystack chunks and reports
// hit end positions through a callback; positions count every symbol
// scanned since construction or the last reset, so feeding a sequence in
// pieces reports the same hits as feeding it whole. Matchers with state
// snapshots can be driven over a tree traversal: capture on push, restore
// on pop.

pub mod horspool;
pub mod myers;
pub mod naive;
pub mod shift_or;

pub use horspool::Horspool;
pub use myers::Myers;
pub use naive::NaiveReverse;
pub use shift_or::ShiftOr;

pub trait Matcher {
    /// Minimum label length worth engaging; also the widest span a hit may
    /// cover.
    fn window_size(&self) -> usize;

    /// Scans `chunk` and invokes `on_hit` with the position one past the
    /// last symbol of every hit.
    fn scan(&mut self, chunk: &[u8], on_hit: &mut dyn FnMut(usize));

    /// Forgets all consumed symbols.
    fn reset(&mut self);
}

pub trait RestorableMatcher: Matcher {
    type State: Clone;

    fn capture(&self) -> Self::State;
    fn restore(&mut self, state: Self::State);
}

/// Keeps a stack of matcher states in lockstep with a tree traversal.
pub struct MatcherStateStack<M: RestorableMatcher> {
    stack: Vec<M::State>,
}

impl<M: RestorableMatcher> MatcherStateStack<M> {
    pub fn new() -> Self {
        MatcherStateStack { stack: Vec::new() }
    }

    pub fn push(&mut self, matcher: &M) {
        self.stack.push(matcher.capture());
    }

    pub fn pop(&mut self, matcher: &mut M) {
        let state = self
            .stack
            .pop()
            .expect("matcher state stack drained below the traversal depth");
        matcher.restore(state);
    }
}

impl<M: RestorableMatcher> Default for MatcherStateStack<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Polymorphic wrapper dispatching per call.
pub enum AnyMatcher {
    Horspool(Horspool),
    ShiftOr(ShiftOr),
    Myers(Myers),
    Naive(NaiveReverse),
}

/// Which concrete matcher the seed phase runs. Pigeonhole seeds are exact,
/// so the bit-parallel matcher gets a zero error budget here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMatcherKind {
    Horspool,
    #[default]
    ShiftOr,
    Myers,
    Naive,
}

impl SeedMatcherKind {
    pub fn matcher(&self, pattern: &[u8]) -> AnyMatcher {
        match self {
            SeedMatcherKind::Horspool => AnyMatcher::Horspool(Horspool::new(pattern)),
            SeedMatcherKind::ShiftOr => AnyMatcher::ShiftOr(ShiftOr::new(pattern)),
            SeedMatcherKind::Myers => AnyMatcher::Myers(Myers::new(pattern, 0)),
            SeedMatcherKind::Naive => AnyMatcher::Naive(NaiveReverse::new(pattern)),
        }
    }
}

#[derive(Clone)]
pub enum AnyMatcherState {
    Horspool(<Horspool as RestorableMatcher>::State),
    ShiftOr(<ShiftOr as RestorableMatcher>::State),
    Myers(<Myers as RestorableMatcher>::State),
    Naive(<NaiveReverse as RestorableMatcher>::State),
}

impl Matcher for AnyMatcher {
    fn window_size(&self) -> usize {
        match self {
            AnyMatcher::Horspool(m) => m.window_size(),
            AnyMatcher::ShiftOr(m) => m.window_size(),
            AnyMatcher::Myers(m) => m.window_size(),
            AnyMatcher::Naive(m) => m.window_size(),
        }
    }

    fn scan(&mut self, chunk: &[u8], on_hit: &mut dyn FnMut(usize)) {
        match self {
            AnyMatcher::Horspool(m) => m.scan(chunk, on_hit),
            AnyMatcher::ShiftOr(m) => m.scan(chunk, on_hit),
            AnyMatcher::Myers(m) => m.scan(chunk, on_hit),
            AnyMatcher::Naive(m) => m.scan(chunk, on_hit),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyMatcher::Horspool(m) => m.reset(),
            AnyMatcher::ShiftOr(m) => m.reset(),
            AnyMatcher::Myers(m) => m.reset(),
            AnyMatcher::Naive(m) => m.reset(),
        }
    }
}

impl RestorableMatcher for AnyMatcher {
    type State = AnyMatcherState;

    fn capture(&self) -> AnyMatcherState {
        match self {
            AnyMatcher::Horspool(m) => AnyMatcherState::Horspool(m.capture()),
            AnyMatcher::ShiftOr(m) => AnyMatcherState::ShiftOr(m.capture()),
            AnyMatcher::Myers(m) => AnyMatcherState::Myers(m.capture()),
            AnyMatcher::Naive(m) => AnyMatcherState::Naive(m.capture()),
        }
    }

    fn restore(&mut self, state: AnyMatcherState) {
        match (self, state) {
            (AnyMatcher::Horspool(m), AnyMatcherState::Horspool(s)) => m.restore(s),
            (AnyMatcher::ShiftOr(m), AnyMatcherState::ShiftOr(s)) => m.restore(s),
            (AnyMatcher::Myers(m), AnyMatcherState::Myers(s)) => m.restore(s),
            (AnyMatcher::Naive(m), AnyMatcherState::Naive(s)) => m.restore(s),
            _ => panic!("matcher state of a different matcher kind"),
        }
    }
}

#[cfg(test)]
pub(crate) fn collect_hits<M: Matcher>(matcher: &mut M, text: &[u8]) -> Vec<usize> {
    let mut hits = Vec::new();
    matcher.scan(text, &mut |end| hits.push(end));
    hits
}
