// Naive reverse-scan matcher: compares the pattern back to front against
// the tail of the consumed stream. Slow on purpose; the reference the other
// matchers are tested against.

use crate::matcher::{Matcher, RestorableMatcher};

pub struct NaiveReverse {
    pattern: Vec<u8>,
    tail: Vec<u8>,
    consumed: usize,
}

#[derive(Clone)]
pub struct NaiveState {
    tail: Vec<u8>,
    consumed: usize,
}

impl NaiveReverse {
    pub fn new(pattern: &[u8]) -> Self {
        assert!(!pattern.is_empty(), "empty pattern");
        NaiveReverse {
            pattern: pattern.to_vec(),
            tail: Vec::new(),
            consumed: 0,
        }
    }
}

impl Matcher for NaiveReverse {
    fn window_size(&self) -> usize {
        self.pattern.len()
    }

    fn scan(&mut self, chunk: &[u8], on_hit: &mut dyn FnMut(usize)) {
        let m = self.pattern.len();
        for &c in chunk {
            self.tail.push(c);
            if self.tail.len() > m {
                self.tail.remove(0);
            }
            self.consumed += 1;
            if self.tail.len() == m
                && self
                    .pattern
                    .iter()
                    .rev()
                    .zip(self.tail.iter().rev())
                    .all(|(a, b)| a == b)
            {
                on_hit(self.consumed);
            }
        }
    }

    fn reset(&mut self) {
        self.tail.clear();
        self.consumed = 0;
    }
}

impl RestorableMatcher for NaiveReverse {
    type State = NaiveState;

    fn capture(&self) -> NaiveState {
        NaiveState {
            tail: self.tail.clone(),
            consumed: self.consumed,
        }
    }

    fn restore(&mut self, state: NaiveState) {
        self.tail = state.tail;
        self.consumed = state.consumed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::collect_hits;
    use crate::matcher::horspool::Horspool;
    use crate::matcher::shift_or::ShiftOr;

    #[test]
    fn agrees_with_the_other_exact_matchers() {
        let texts: [&[u8]; 3] = [b"aaaa", b"gattacagattaca", b"cacacaca"];
        let patterns: [&[u8]; 3] = [b"aa", b"ttaca", b"caca"];
        for text in texts {
            for pattern in patterns {
                let mut naive = NaiveReverse::new(pattern);
                let mut horspool = Horspool::new(pattern);
                let mut shift_or = ShiftOr::new(pattern);
                let expected = collect_hits(&mut naive, text);
                assert_eq!(collect_hits(&mut horspool, text), expected);
                assert_eq!(collect_hits(&mut shift_or, text), expected);
            }
        }
    }
}
