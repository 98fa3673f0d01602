//! Fixed-width binary fingerprints (fuzzy hashes).
//!
//! A [`FuzzyHash`] is a bit-vector whose width is a multiple of 64, stored
//! as 64-bit limbs with limb 0 most significant. Working in limbs instead
//! of bytes keeps the Hamming distance loop short: one XOR and one
//! `count_ones` per 64 bits.
//!
//! ## Textual form
//!
//! 16 hex characters per limb, most-significant limb first, either case on
//! input and lowercase on output. Parsing uses a 256-entry decode table and
//! consumes two characters per iteration; a trailing partial limb (input
//! length not a multiple of 16) is dropped.
//!
//! ## Byte form
//!
//! [`FuzzyHash::to_bytes`] is the identity key used by the index: little
//! endian within each limb, limb 0 first. The same image is what the
//! digest layer consumes when fingerprints themselves are hashed.

/// Hex decode table: `-1` for non-hex bytes, the nibble value otherwise.
const HEX_DECODE: [i8; 256] = {
    let mut t = [-1i8; 256];
    let mut i = 0;
    while i < 10 {
        t[b'0' as usize + i] = i as i8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        t[b'a' as usize + i] = 10 + i as i8;
        t[b'A' as usize + i] = 10 + i as i8;
        i += 1;
    }
    t
};

/// Decode a hex string to bytes, accepting either case.
pub(crate) fn decode_hex(s: &str) -> crate::Result<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(crate::ProximError::OddHexLength { len: bytes.len() });
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for (offset, pair) in bytes.chunks_exact(2).enumerate() {
        let d0 = HEX_DECODE[pair[0] as usize];
        if d0 < 0 {
            return Err(crate::ProximError::BadHexChar {
                byte: pair[0],
                offset: offset * 2,
            });
        }
        let d1 = HEX_DECODE[pair[1] as usize];
        if d1 < 0 {
            return Err(crate::ProximError::BadHexChar {
                byte: pair[1],
                offset: offset * 2 + 1,
            });
        }
        out.push(((d0 as u8) << 4) | d1 as u8);
    }
    Ok(out)
}

/// A fixed-width binary fingerprint.
///
/// Limb 0 is the most significant 64 bits. Equality and hashing are by
/// value, so a `FuzzyHash` can key an exact-match map directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuzzyHash {
    limbs: Vec<u64>,
}

impl FuzzyHash {
    /// Parse a hex string into a fingerprint.
    ///
    /// Accepts both cases. Fails on odd length or a non-hex byte; a
    /// trailing partial limb is silently dropped.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = decode_hex(s)?;
        let limbs = bytes
            .chunks_exact(8)
            .map(|c| u64::from_be_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self { limbs })
    }

    /// Build a fingerprint from raw limbs, most significant first.
    pub fn from_limbs(limbs: Vec<u64>) -> Self {
        Self { limbs }
    }

    /// Rebuild a fingerprint from its identity-key byte image.
    ///
    /// The buffer must be a whole number of little-endian limbs.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(crate::ProximError::BadByteLength { len: bytes.len() });
        }
        let limbs = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self { limbs })
    }

    /// The identity-key byte image: little endian within each limb, limb 0
    /// first. Hashable and comparable by content.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.limbs.len() * 8);
        for limb in &self.limbs {
            out.extend_from_slice(&limb.to_le_bytes());
        }
        out
    }

    /// Width in bits.
    #[inline]
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.limbs.len() * 64
    }

    /// The limbs, most significant first.
    #[inline]
    #[must_use]
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    /// The least-significant limb ANDed with `mask`.
    #[inline]
    #[must_use]
    pub fn and_last(&self, mask: u64) -> u64 {
        match self.limbs.last() {
            Some(&limb) => limb & mask,
            None => 0,
        }
    }

    /// Shift the whole vector right by `s` bits, in place.
    ///
    /// Bits move from more-significant limbs into less-significant ones.
    /// `s` must be below 64; block extraction only ever shifts by the
    /// block width, which is capped at 16.
    pub fn rsh(&mut self, s: u32) {
        debug_assert!(s < 64);
        if s == 0 {
            return;
        }
        for i in (1..self.limbs.len()).rev() {
            self.limbs[i] = (self.limbs[i] >> s) | (self.limbs[i - 1] << (64 - s));
        }
        if let Some(first) = self.limbs.first_mut() {
            *first >>= s;
        }
    }

    /// Hamming distance: the number of differing bit positions.
    ///
    /// Both fingerprints must have the same width.
    #[inline]
    #[must_use]
    pub fn hamming(&self, other: &FuzzyHash) -> usize {
        debug_assert_eq!(self.limbs.len(), other.limbs.len());
        self.limbs
            .iter()
            .zip(other.limbs.iter())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }
}

impl std::fmt::Display for FuzzyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for limb in &self.limbs {
            write!(f, "{limb:016x}")?;
        }
        Ok(())
    }
}

/// Gather selected bits of `value` into compact values, one per selection.
///
/// For each selection, bit `j` of the output is bit `selection[j]` of the
/// input. This is the building block for probing every `block_size`-bit
/// subset of a wide trailing block.
#[must_use]
pub fn bit_combinations(value: u64, selections: &[Vec<usize>]) -> Vec<u64> {
    selections
        .iter()
        .map(|sel| {
            sel.iter()
                .enumerate()
                .fold(0u64, |acc, (j, &bit)| acc | (((value >> bit) & 1) << j))
        })
        .collect()
}
