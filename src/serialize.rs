// Binary store format, little-endian throughout:
//
//   u32 magic "JSTM"   u32 version
//   u8  packing flag (2 or 3 bits per symbol)
//   u64 reference length, packed reference
//   u32 haplotype count
//   u64 variant count
//   per variant: u32 lo, u32 hi, u32 alt_len, packed alternate
//   per variant: ceil(H/8) coverage bytes, little-endian bit order
//
// Loading validates magic, version, flag and every variant against the
// reference bounds; any mismatch or truncation reports `StoreCorrupt`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::coverage::Coverage;
use crate::dna::{self, Packing};
use crate::error::{Error, Result};
use crate::store::RcmsStore;
use crate::variant::Variant;

pub const STORE_MAGIC: u32 = 0x4A53_544D;
pub const STORE_VERSION: u32 = 0x0002;

pub fn save_store(store: &RcmsStore, mut writer: impl Write) -> Result<()> {
    let packing = dna::choose_packing(
        std::iter::once(store.source())
            .chain(store.rows().iter().map(|row| row.variant.alt.as_slice())),
    )?;

    let io_err = |e: std::io::Error| Error::StoreCorrupt(format!("write failed: {}", e));

    writer.write_all(&STORE_MAGIC.to_le_bytes()).map_err(io_err)?;
    writer.write_all(&STORE_VERSION.to_le_bytes()).map_err(io_err)?;
    writer.write_all(&[packing.flag()]).map_err(io_err)?;

    writer
        .write_all(&(store.source().len() as u64).to_le_bytes())
        .map_err(io_err)?;
    let mut packed = Vec::new();
    dna::pack(store.source(), packing, &mut packed)?;
    writer.write_all(&packed).map_err(io_err)?;

    writer
        .write_all(&(store.haplotypes() as u32).to_le_bytes())
        .map_err(io_err)?;
    writer
        .write_all(&(store.rows().len() as u64).to_le_bytes())
        .map_err(io_err)?;

    for row in store.rows() {
        let v = &row.variant;
        writer.write_all(&v.lo().to_le_bytes()).map_err(io_err)?;
        writer.write_all(&v.hi().to_le_bytes()).map_err(io_err)?;
        writer
            .write_all(&(v.alt.len() as u32).to_le_bytes())
            .map_err(io_err)?;
        packed.clear();
        dna::pack(&v.alt, packing, &mut packed)?;
        writer.write_all(&packed).map_err(io_err)?;
    }

    let mut cov_bytes = Vec::new();
    for row in store.rows() {
        cov_bytes.clear();
        row.coverage.to_bytes(&mut cov_bytes);
        writer.write_all(&cov_bytes).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

pub fn load_store(mut reader: impl Read) -> Result<RcmsStore> {
    let magic = read_u32(&mut reader)?;
    if magic != STORE_MAGIC {
        return Err(Error::StoreCorrupt(format!(
            "bad magic {:#010x}, expected {:#010x}",
            magic, STORE_MAGIC
        )));
    }
    let version = read_u32(&mut reader)?;
    if version != STORE_VERSION {
        return Err(Error::StoreCorrupt(format!(
            "unsupported version {:#06x}",
            version
        )));
    }
    let packing = Packing::from_flag(read_u8(&mut reader)?)?;

    let source_len = read_u64(&mut reader)? as usize;
    let source = read_packed(&mut reader, source_len, packing)?;

    let haplotypes = read_u32(&mut reader)? as usize;
    let variant_count = read_u64(&mut reader)? as usize;

    let mut variants = Vec::with_capacity(variant_count);
    for _ in 0..variant_count {
        let lo = read_u32(&mut reader)?;
        let hi = read_u32(&mut reader)?;
        if lo > hi || hi as usize > source_len {
            return Err(Error::StoreCorrupt(format!(
                "variant [{}, {}) outside reference of length {}",
                lo, hi, source_len
            )));
        }
        let alt_len = read_u32(&mut reader)? as usize;
        let alt = read_packed(&mut reader, alt_len, packing)?;
        variants.push(Variant::new(lo, hi, alt));
    }

    let mut store = RcmsStore::new(source, haplotypes);
    let cov_len = haplotypes.div_ceil(8);
    let mut cov_buf = vec![0u8; cov_len];
    for variant in variants {
        reader
            .read_exact(&mut cov_buf)
            .map_err(|_| Error::StoreCorrupt("truncated coverage section".into()))?;
        let coverage = Coverage::from_bytes(haplotypes, &cov_buf)?;
        store
            .insert(variant, coverage)
            .map_err(|e| Error::StoreCorrupt(format!("row rejected on load: {}", e)))?;
    }
    Ok(store)
}

pub fn save_store_file(store: &RcmsStore, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    save_store(store, BufWriter::new(file))
}

pub fn load_store_file(path: &Path) -> Result<RcmsStore> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    load_store(BufReader::new(file))
}

fn read_u8(reader: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::StoreCorrupt("unexpected end of store".into()))?;
    Ok(buf[0])
}

fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::StoreCorrupt("unexpected end of store".into()))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::StoreCorrupt("unexpected end of store".into()))?;
    Ok(u64::from_le_bytes(buf))
}

fn read_packed(reader: &mut impl Read, symbols: usize, packing: Packing) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; packing.packed_len(symbols)];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::StoreCorrupt("truncated sequence section".into()))?;
    dna::unpack(&buf, symbols, packing)
}
