// SAM output: one record per emitted match, referencing the representative
// haplotype and its linear position. The record's alignment is recomputed
// against the materialised haplotype window so indel paths get a faithful
// CIGAR. Reads without matches are written unmapped.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{Error, Result};
use crate::search::align::align_match;
use crate::search::matches::{linear_position, SearchMatch};
use crate::store::RcmsStore;

const FLAG_UNMAPPED: u32 = 0x4;

pub struct SamWriter<W: Write> {
    out: W,
    /// Materialised haplotypes, filled on first use.
    hap_cache: HashMap<usize, Vec<u8>>,
}

impl<W: Write> SamWriter<W> {
    pub fn new(out: W) -> Self {
        SamWriter {
            out,
            hap_cache: HashMap::new(),
        }
    }

    pub fn write_header(&mut self, store: &RcmsStore) -> Result<()> {
        writeln!(self.out, "@HD\tVN:1.6\tSO:unsorted").map_err(write_err)?;
        for h in 0..store.haplotypes() {
            writeln!(
                self.out,
                "@SQ\tSN:haplotype{}\tLN:{}",
                h,
                store.haplotype_length(h)
            )
            .map_err(write_err)?;
        }
        writeln!(
            self.out,
            "@PG\tID:panmap\tPN:panmap\tVN:{}",
            env!("CARGO_PKG_VERSION")
        )
        .map_err(write_err)?;
        Ok(())
    }

    pub fn write_match(
        &mut self,
        store: &RcmsStore,
        name: &str,
        needle: &[u8],
        m: &SearchMatch,
    ) -> Result<()> {
        let hap = m
            .coverage
            .first()
            .ok_or_else(|| Error::InternalInvariant("match without coverage".into()))?;
        let pos = linear_position(store, hap, m.position.label_offset, m.start_inside).max(0)
            as usize;
        let hap_seq = self
            .hap_cache
            .entry(hap)
            .or_insert_with(|| store.haplotype_sequence(hap));
        let window_end = (pos + needle.len() + m.errors as usize).min(hap_seq.len());
        let window = &hap_seq[pos.min(hap_seq.len())..window_end];
        let alignment = align_match(needle, window);

        writeln!(
            self.out,
            "{}\t0\thaplotype{}\t{}\t255\t{}\t*\t0\t0\t{}\t*\tNM:i:{}",
            name,
            hap,
            pos + 1,
            alignment.cigar,
            String::from_utf8_lossy(needle),
            alignment.edits,
        )
        .map_err(write_err)?;
        Ok(())
    }

    pub fn write_unmapped(&mut self, name: &str, needle: &[u8]) -> Result<()> {
        writeln!(
            self.out,
            "{}\t{}\t*\t0\t0\t*\t*\t0\t0\t{}\t*",
            name,
            FLAG_UNMAPPED,
            String::from_utf8_lossy(needle),
        )
        .map_err(write_err)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(write_err)
    }
}

fn write_err(e: std::io::Error) -> Error {
    Error::InvalidInput(format!("writing matches failed: {}", e))
}
