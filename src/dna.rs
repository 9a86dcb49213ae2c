// Symbol packing for the binary store format: 2 bits per symbol over ACGT,
// or 3 bits per symbol over ACGTN when ambiguous bases occur. Case is
// normalised on encode; decode always yields upper case.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    Two,
    Three,
}

impl Packing {
    pub fn flag(self) -> u8 {
        match self {
            Packing::Two => 2,
            Packing::Three => 3,
        }
    }

    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            2 => Ok(Packing::Two),
            3 => Ok(Packing::Three),
            other => Err(Error::StoreCorrupt(format!(
                "unknown packing flag {}",
                other
            ))),
        }
    }

    pub fn bits(self) -> usize {
        match self {
            Packing::Two => 2,
            Packing::Three => 3,
        }
    }

    pub fn packed_len(self, symbols: usize) -> usize {
        (symbols * self.bits()).div_ceil(8)
    }
}

/// Narrowest packing able to hold every symbol of every given sequence, or
/// `InvalidInput` when a symbol is outside ACGTN.
pub fn choose_packing<'a>(sequences: impl IntoIterator<Item = &'a [u8]>) -> Result<Packing> {
    let mut packing = Packing::Two;
    for seq in sequences {
        for &sym in seq {
            match sym.to_ascii_uppercase() {
                b'A' | b'C' | b'G' | b'T' => {}
                b'N' => packing = Packing::Three,
                other => {
                    return Err(Error::InvalidInput(format!(
                        "symbol {:?} cannot be packed",
                        other as char
                    )))
                }
            }
        }
    }
    Ok(packing)
}

fn code_of(sym: u8, packing: Packing) -> Result<u8> {
    let code = match sym.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' => 3,
        b'N' if packing == Packing::Three => 4,
        other => {
            return Err(Error::InvalidInput(format!(
                "symbol {:?} not representable with {}-bit packing",
                other as char,
                packing.bits()
            )))
        }
    };
    Ok(code)
}

const SYMBOLS: [u8; 5] = *b"ACGTN";

/// Packs `seq` bit-by-bit, little-endian within each byte.
pub fn pack(seq: &[u8], packing: Packing, out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    out.resize(start + packing.packed_len(seq.len()), 0);
    let bits = packing.bits();
    for (i, &sym) in seq.iter().enumerate() {
        let code = code_of(sym, packing)?;
        let bit_pos = i * bits;
        for b in 0..bits {
            if code >> b & 1 == 1 {
                let pos = bit_pos + b;
                out[start + pos / 8] |= 1 << (pos % 8);
            }
        }
    }
    Ok(())
}

pub fn unpack(bytes: &[u8], symbols: usize, packing: Packing) -> Result<Vec<u8>> {
    if bytes.len() != packing.packed_len(symbols) {
        return Err(Error::StoreCorrupt(format!(
            "expected {} packed bytes for {} symbols, got {}",
            packing.packed_len(symbols),
            symbols,
            bytes.len()
        )));
    }
    let bits = packing.bits();
    let mut out = Vec::with_capacity(symbols);
    for i in 0..symbols {
        let bit_pos = i * bits;
        let mut code = 0u8;
        for b in 0..bits {
            let pos = bit_pos + b;
            if bytes[pos / 8] >> (pos % 8) & 1 == 1 {
                code |= 1 << b;
            }
        }
        if code as usize >= if packing == Packing::Two { 4 } else { 5 } {
            return Err(Error::StoreCorrupt(format!("invalid symbol code {}", code)));
        }
        out.push(SYMBOLS[code as usize]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bit_round_trip() {
        let seq = b"ACGTTGCAACG";
        let mut packed = Vec::new();
        pack(seq, Packing::Two, &mut packed).unwrap();
        assert_eq!(packed.len(), 3);
        assert_eq!(unpack(&packed, seq.len(), Packing::Two).unwrap(), seq);
    }

    #[test]
    fn three_bit_round_trip_with_n() {
        let seq = b"ACGNNTA";
        let mut packed = Vec::new();
        pack(seq, Packing::Three, &mut packed).unwrap();
        assert_eq!(unpack(&packed, seq.len(), Packing::Three).unwrap(), seq);
    }

    #[test]
    fn packing_choice() {
        assert_eq!(
            choose_packing([b"ACGT".as_slice()]).unwrap(),
            Packing::Two
        );
        assert_eq!(
            choose_packing([b"ACGT".as_slice(), b"NN".as_slice()]).unwrap(),
            Packing::Three
        );
        assert!(choose_packing([b"ACXT".as_slice()]).is_err());
    }

    #[test]
    fn n_rejected_under_two_bit() {
        let mut out = Vec::new();
        assert!(pack(b"AN", Packing::Two, &mut out).is_err());
    }
}
