// Myers bit-parallel approximate matcher: reports every text position where
// some substring ending there lies within `max_errors` edits of the
// pattern. Patterns longer than one machine word run the blocked automaton
// with carry propagation between words.

use crate::matcher::{Matcher, RestorableMatcher};

pub struct Myers {
    peq: Vec<u64>,
    blocks: usize,
    pattern_len: usize,
    max_errors: usize,
    last_bit: u64,
    vp: Vec<u64>,
    vn: Vec<u64>,
    score: usize,
    consumed: usize,
}

#[derive(Clone)]
pub struct MyersState {
    vp: Vec<u64>,
    vn: Vec<u64>,
    score: usize,
    consumed: usize,
}

impl Myers {
    pub fn new(pattern: &[u8], max_errors: usize) -> Self {
        assert!(!pattern.is_empty(), "empty pattern");
        let blocks = pattern.len().div_ceil(64);
        let mut peq = vec![0u64; 256 * blocks];
        for (i, &c) in pattern.iter().enumerate() {
            peq[c as usize * blocks + i / 64] |= 1u64 << (i % 64);
        }
        Myers {
            peq,
            blocks,
            pattern_len: pattern.len(),
            max_errors,
            last_bit: 1u64 << ((pattern.len() - 1) % 64),
            vp: vec![!0u64; blocks],
            vn: vec![0u64; blocks],
            score: pattern.len(),
            consumed: 0,
        }
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    /// Current edit distance of the pattern against the best substring
    /// ending at the last consumed symbol.
    pub fn current_score(&self) -> usize {
        self.score
    }

    fn advance(&mut self, c: u8) {
        let row = c as usize * self.blocks;
        // horizontal delta carried into each block: -1, 0 or +1
        let mut hin: i32 = 0;
        for b in 0..self.blocks {
            let mut eq = self.peq[row + b];
            let pv = self.vp[b];
            let mv = self.vn[b];
            let xv = eq | mv;
            if hin < 0 {
                eq |= 1;
            }
            let xh = (((eq & pv).wrapping_add(pv)) ^ pv) | eq;
            let mut ph = mv | !(xh | pv);
            let mut mh = pv & xh;

            if b == self.blocks - 1 {
                if ph & self.last_bit != 0 {
                    self.score += 1;
                } else if mh & self.last_bit != 0 {
                    self.score -= 1;
                }
            }

            let hout = (ph >> 63 & 1) as i32 - (mh >> 63 & 1) as i32;
            ph <<= 1;
            mh <<= 1;
            if hin < 0 {
                mh |= 1;
            } else if hin > 0 {
                ph |= 1;
            }
            self.vp[b] = mh | !(xv | ph);
            self.vn[b] = ph & xv;
            hin = hout;
        }
        self.consumed += 1;
    }
}

impl Matcher for Myers {
    fn window_size(&self) -> usize {
        self.pattern_len + self.max_errors
    }

    fn scan(&mut self, chunk: &[u8], on_hit: &mut dyn FnMut(usize)) {
        for &c in chunk {
            self.advance(c);
            if self.score <= self.max_errors {
                on_hit(self.consumed);
            }
        }
    }

    fn reset(&mut self) {
        self.vp.iter_mut().for_each(|b| *b = !0);
        self.vn.iter_mut().for_each(|b| *b = 0);
        self.score = self.pattern_len;
        self.consumed = 0;
    }
}

impl RestorableMatcher for Myers {
    type State = MyersState;

    fn capture(&self) -> MyersState {
        MyersState {
            vp: self.vp.clone(),
            vn: self.vn.clone(),
            score: self.score,
            consumed: self.consumed,
        }
    }

    fn restore(&mut self, state: MyersState) {
        self.vp = state.vp;
        self.vn = state.vn;
        self.score = state.score;
        self.consumed = state.consumed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::collect_hits;

    /// Text positions where some substring ending there is within `k`
    /// edits of `pattern`, by dynamic programming.
    fn dp_hit_ends(pattern: &[u8], text: &[u8], k: usize) -> Vec<usize> {
        let m = pattern.len();
        let mut prev: Vec<usize> = (0..=m).collect();
        let mut hits = Vec::new();
        for (j, &tc) in text.iter().enumerate() {
            let mut cur = vec![0usize; m + 1];
            for i in 1..=m {
                let sub = prev[i - 1] + usize::from(pattern[i - 1] != tc);
                cur[i] = sub.min(prev[i] + 1).min(cur[i - 1] + 1);
            }
            if cur[m] <= k {
                hits.push(j + 1);
            }
            prev = cur;
        }
        hits
    }

    #[test]
    fn exact_matching_with_zero_errors() {
        let mut m = Myers::new(b"ana", 0);
        assert_eq!(collect_hits(&mut m, b"banana"), vec![4, 6]);
    }

    #[test]
    fn agrees_with_dynamic_programming() {
        let cases: [(&[u8], &[u8], usize); 4] = [
            (b"acgt", b"acgtacgtaagt", 1),
            (b"aaaa", b"aabaaabbaaaa", 1),
            (b"gattaca", b"gattagattacaca", 2),
            (b"ttt", b"tctctttcttt", 0),
        ];
        for (pattern, text, k) in cases {
            let mut m = Myers::new(pattern, k);
            assert_eq!(
                collect_hits(&mut m, text),
                dp_hit_ends(pattern, text, k),
                "pattern {:?} text {:?} k {}",
                String::from_utf8_lossy(pattern),
                String::from_utf8_lossy(text),
                k
            );
        }
    }

    #[test]
    fn long_pattern_blocks_agree_with_dp() {
        let pattern: Vec<u8> = (0..80).map(|i| b"acgt"[i % 4]).collect();
        let mut text = pattern.clone();
        text[40] = b'x'; // one substitution inside
        text.extend_from_slice(b"acg");
        let mut m = Myers::new(&pattern, 2);
        assert_eq!(collect_hits(&mut m, &text), dp_hit_ends(&pattern, &text, 2));
    }

    #[test]
    fn split_scanning_matches_whole_scanning() {
        let pattern = b"acca";
        let text = b"gaccatacgacca";
        let mut whole = Myers::new(pattern, 1);
        let expected = collect_hits(&mut whole, text);
        for cut in 0..text.len() {
            let mut m = Myers::new(pattern, 1);
            let mut hits = collect_hits(&mut m, &text[..cut]);
            hits.extend(collect_hits(&mut m, &text[cut..]));
            assert_eq!(hits, expected, "split at {}", cut);
        }
    }
}
