// The RCMS store: one reference sequence, an ordered list of covered
// variants, and the haplotype count. Built once by loaders, read-only during
// search. A reversed logical view supports leftward extension without
// copying the underlying sequences.

use std::cmp::Ordering;
use std::ops::Range;

use crate::coverage::Coverage;
use crate::error::{Error, Result};
use crate::variant::{Breakpoint, Variant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveredVariant {
    pub variant: Variant,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcmsStore {
    source: Vec<u8>,
    rows: Vec<CoveredVariant>,
    haplotypes: usize,
}

/// Read access shared by the forward store and its reversed view; the
/// sequence tree is generic over this.
pub trait StoreRead {
    fn source_len(&self) -> usize;
    fn haplotype_count(&self) -> usize;
    fn variant_count(&self) -> usize;
    fn breakpoint(&self, i: usize) -> Breakpoint;
    fn alt_len(&self, i: usize) -> usize;
    fn coverage(&self, i: usize) -> &Coverage;
    /// Appends the reference symbols of `range` to `out`.
    fn push_source(&self, range: Range<usize>, out: &mut Vec<u8>);
    /// Appends alternate symbols `range` of variant `i` to `out`.
    fn push_alt(&self, i: usize, range: Range<usize>, out: &mut Vec<u8>);

    fn is_insertion_at_point(&self, i: usize) -> bool {
        self.breakpoint(i).is_insertion_point()
    }
}

impl RcmsStore {
    pub fn new(source: impl Into<Vec<u8>>, haplotypes: usize) -> Self {
        RcmsStore {
            source: source.into(),
            rows: Vec::new(),
            haplotypes,
        }
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn rows(&self) -> &[CoveredVariant] {
        &self.rows
    }

    pub fn haplotypes(&self) -> usize {
        self.haplotypes
    }

    /// Appends a row; rows must arrive in strict variant order.
    pub fn add(&mut self, variant: Variant, coverage: Coverage) -> Result<()> {
        self.validate_row(&variant, &coverage)?;
        if let Some(last) = self.rows.last() {
            if variant <= last.variant {
                return Err(Error::InvalidRow(format!(
                    "variant at [{}, {}) not after the last inserted row",
                    variant.lo(),
                    variant.hi()
                )));
            }
        }
        self.rows.push(CoveredVariant { variant, coverage });
        Ok(())
    }

    /// Sorted splice for out-of-order callers; equal variants land after
    /// existing ones.
    pub fn insert(&mut self, variant: Variant, coverage: Coverage) -> Result<()> {
        self.validate_row(&variant, &coverage)?;
        let at = self.rows.partition_point(|row| row.variant <= variant);
        self.rows.insert(at, CoveredVariant { variant, coverage });
        Ok(())
    }

    fn validate_row(&self, variant: &Variant, coverage: &Coverage) -> Result<()> {
        if variant.hi() as usize > self.source.len() {
            return Err(Error::InvalidRow(format!(
                "variant ends at {} past the reference of length {}",
                variant.hi(),
                self.source.len()
            )));
        }
        if coverage.domain() != self.haplotypes {
            return Err(Error::InvalidRow(format!(
                "coverage domain {} does not match haplotype count {}",
                coverage.domain(),
                self.haplotypes
            )));
        }
        Ok(())
    }

    /// Length of haplotype `h` after applying its variants.
    pub fn haplotype_length(&self, h: usize) -> usize {
        let mut len = self.source.len() as i64;
        for row in &self.rows {
            if row.coverage.test(h) {
                len += row.variant.length_offset();
            }
        }
        len as usize
    }

    /// Materialises haplotype `h` by applying exactly its variants in order.
    pub fn haplotype_sequence(&self, h: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.source.len());
        let mut cursor = 0usize;
        for row in &self.rows {
            if !row.coverage.test(h) {
                continue;
            }
            let v = &row.variant;
            out.extend_from_slice(&self.source[cursor..v.lo() as usize]);
            out.extend_from_slice(&v.alt);
            cursor = v.hi() as usize;
        }
        out.extend_from_slice(&self.source[cursor..]);
        out
    }

    /// Indices of rows whose reference extent intersects `[s, e)`.
    pub fn rows_overlapping(&self, s: u32, e: u32) -> impl Iterator<Item = usize> + '_ {
        let upper = self.rows.partition_point(|row| row.variant.lo() < e);
        (0..upper).filter(move |&i| self.rows[i].variant.overlaps_span(s, e))
    }

    pub fn reversed(&self) -> ReversedStore<'_> {
        ReversedStore::new(self)
    }
}

impl StoreRead for RcmsStore {
    fn source_len(&self) -> usize {
        self.source.len()
    }

    fn haplotype_count(&self) -> usize {
        self.haplotypes
    }

    fn variant_count(&self) -> usize {
        self.rows.len()
    }

    fn breakpoint(&self, i: usize) -> Breakpoint {
        self.rows[i].variant.breakpoint
    }

    fn alt_len(&self, i: usize) -> usize {
        self.rows[i].variant.alt.len()
    }

    fn coverage(&self, i: usize) -> &Coverage {
        &self.rows[i].coverage
    }

    fn push_source(&self, range: Range<usize>, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.source[range]);
    }

    fn push_alt(&self, i: usize, range: Range<usize>, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.rows[i].variant.alt[range]);
    }
}

/// Mirror view: positions remap as `lo' = |R| − hi`, `hi' = |R| − lo`,
/// alternates read back to front, coverages unchanged. Only the sorted
/// index permutation is materialised.
pub struct ReversedStore<'s> {
    store: &'s RcmsStore,
    /// Reversed-order rank -> forward row index.
    order: Vec<u32>,
}

impl<'s> ReversedStore<'s> {
    pub fn new(store: &'s RcmsStore) -> Self {
        let len = store.source.len() as u32;
        let mut order: Vec<u32> = (0..store.rows.len() as u32).collect();
        order.sort_by(|&a, &b| {
            let va = &store.rows[a as usize].variant;
            let vb = &store.rows[b as usize].variant;
            let key_a = (len - va.hi(), len - va.lo());
            let key_b = (len - vb.hi(), len - vb.lo());
            key_a
                .cmp(&key_b)
                .then_with(|| cmp_reversed_alt(&va.alt, &vb.alt))
        });
        ReversedStore { store, order }
    }

    /// Forward row index behind reversed rank `i`.
    pub fn forward_index(&self, i: usize) -> usize {
        self.order[i] as usize
    }

    /// Reversed rank of forward row `i`; linear scan, used off the hot path.
    pub fn reversed_index(&self, forward: usize) -> usize {
        self.order
            .iter()
            .position(|&o| o as usize == forward)
            .expect("forward index outside the store")
    }

    pub fn forward(&self) -> &RcmsStore {
        self.store
    }

    /// Remapped variant for tests and diagnostics.
    pub fn variant(&self, i: usize) -> Variant {
        let len = self.store.source.len() as u32;
        let v = &self.store.rows[self.forward_index(i)].variant;
        let mut alt = v.alt.clone();
        alt.reverse();
        Variant::new(len - v.hi(), len - v.lo(), alt)
    }
}

fn cmp_reversed_alt(a: &[u8], b: &[u8]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

impl StoreRead for ReversedStore<'_> {
    fn source_len(&self) -> usize {
        self.store.source.len()
    }

    fn haplotype_count(&self) -> usize {
        self.store.haplotypes
    }

    fn variant_count(&self) -> usize {
        self.order.len()
    }

    fn breakpoint(&self, i: usize) -> Breakpoint {
        let len = self.store.source.len() as u32;
        let v = &self.store.rows[self.forward_index(i)].variant;
        Breakpoint::new(len - v.hi(), len - v.lo())
    }

    fn alt_len(&self, i: usize) -> usize {
        self.store.rows[self.forward_index(i)].variant.alt.len()
    }

    fn coverage(&self, i: usize) -> &Coverage {
        &self.store.rows[self.forward_index(i)].coverage
    }

    fn push_source(&self, range: Range<usize>, out: &mut Vec<u8>) {
        let len = self.store.source.len();
        out.extend((range.start..range.end).map(|p| self.store.source[len - 1 - p]));
    }

    fn push_alt(&self, i: usize, range: Range<usize>, out: &mut Vec<u8>) {
        let alt = &self.store.rows[self.forward_index(i)].variant.alt;
        let len = alt.len();
        out.extend((range.start..range.end).map(|p| alt[len - 1 - p]));
    }
}
