//! TLSH-style locality-sensitive digest of a byte stream.
//!
//! The digest is a fixed 35-byte record: a rolling Pearson checksum, a
//! bucketed-logarithm length code, two packed quartile ratios, and a
//! 32-byte code quantizing 128 bucket counters to 2-bit quartile labels.
//! Pairwise Hamming distance between digests of similar inputs stays
//! small, which is what makes them useful fingerprints for the
//! [`HammingIndex`](crate::HammingIndex).
//!
//! Not a cryptographic hash: the construction is trivially malleable and
//! only meant for similarity.
//!
//! ## References
//!
//! - Oliver, Cheng & Chen (2013). "TLSH - a locality sensitive hash"

mod buckets;
mod quartiles;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{ProximError, Result};

use buckets::{fill_buckets, NUM_BUCKETS};
use quartiles::quartile_points;

/// Bytes of quantized bucket labels in a digest.
pub const CODE_SIZE: usize = 32;
/// Total digest size: checksum, length code, quartile ratios, code.
pub const DIGEST_SIZE: usize = 3 + CODE_SIZE;

// Natural logs of 1.5, 1.3 and 1.1; the offsets keep the piecewise length
// code continuous at the 656 and 3199 breakpoints.
const LOG_1_5: f64 = 0.4054651;
const LOG_1_3: f64 = 0.26236426;
const LOG_1_1: f64 = 0.095310180;

/// A 35-byte locality-sensitive digest.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tlsh {
    checksum: u8,
    length_code: u8,
    q1_ratio: u8,
    q2_ratio: u8,
    code: [u8; CODE_SIZE],
}

impl Tlsh {
    /// Digest a byte stream.
    ///
    /// Fails with [`ProximError::StreamTooShort`] when the stream holds
    /// fewer than 5 bytes; non-EOF read errors are propagated.
    pub fn hash_from_stream<R: BufRead>(reader: R) -> Result<Self> {
        let (buckets, checksum, total) = fill_buckets(reader)?;
        let (q1, q2, q3) = quartile_points(&buckets);

        // A degenerate stream can leave q3 at zero; both ratios are
        // defined as zero there instead of dividing.
        let (q1_ratio, q2_ratio) = if q3 == 0 {
            (0, 0)
        } else {
            (
                ((q1 * 100 / q3) % 16) as u8,
                ((q2 * 100 / q3) % 16) as u8,
            )
        };

        Ok(Self {
            checksum,
            length_code: length_code(total),
            q1_ratio,
            q2_ratio,
            code: quantize(&buckets, q1, q2, q3),
        })
    }

    /// Digest an in-memory buffer.
    pub fn hash_from_bytes(buf: &[u8]) -> Result<Self> {
        Self::hash_from_stream(buf)
    }

    /// Digest a file's contents.
    pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::hash_from_stream(BufReader::new(File::open(path)?))
    }

    /// Parse the 70-character hex rendering back into a digest.
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = crate::fingerprint::decode_hex(s)?;
        if bytes.len() != DIGEST_SIZE {
            return Err(ProximError::BadDigestLength { len: bytes.len() });
        }
        let q_ratio = bytes[2];
        let mut code = [0u8; CODE_SIZE];
        code.copy_from_slice(&bytes[3..]);
        Ok(Self {
            checksum: swap_nibbles(bytes[0]),
            length_code: swap_nibbles(bytes[1]),
            q1_ratio: (q_ratio >> 4) & 0xF,
            q2_ratio: q_ratio & 0xF,
            code,
        })
    }

    /// The 35-byte binary image: nibble-swapped checksum and length code,
    /// packed quartile ratios, then the code.
    #[must_use]
    pub fn binary(&self) -> [u8; DIGEST_SIZE] {
        let mut out = [0u8; DIGEST_SIZE];
        out[0] = swap_nibbles(self.checksum);
        out[1] = swap_nibbles(self.length_code);
        out[2] = self.q_ratio();
        out[3..].copy_from_slice(&self.code);
        out
    }

    /// The rolling Pearson checksum.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// The bucketed-logarithm length code.
    #[must_use]
    pub fn length_code(&self) -> u8 {
        self.length_code
    }

    /// Quartile ratio `(q1 * 100 / q3) mod 16`.
    #[must_use]
    pub fn q1_ratio(&self) -> u8 {
        self.q1_ratio
    }

    /// Quartile ratio `(q2 * 100 / q3) mod 16`.
    #[must_use]
    pub fn q2_ratio(&self) -> u8 {
        self.q2_ratio
    }

    /// Both ratios packed into one byte, q1 high.
    #[must_use]
    pub fn q_ratio(&self) -> u8 {
        ((self.q1_ratio & 0xF) << 4) | (self.q2_ratio & 0xF)
    }

    /// The 32 bytes of quantized bucket labels.
    #[must_use]
    pub fn code(&self) -> &[u8; CODE_SIZE] {
        &self.code
    }
}

impl std::fmt::Display for Tlsh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.binary() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Bucketed logarithm of the stream length.
fn length_code(len: u64) -> u8 {
    let n = len as f64;
    let code = if len <= 656 {
        (n.ln() / LOG_1_5).floor()
    } else if len <= 3199 {
        (n.ln() / LOG_1_3 - 8.72777).floor()
    } else {
        (n.ln() / LOG_1_1 - 62.5472).floor()
    };
    (code as u64 % 255) as u8
}

const fn swap_nibbles(b: u8) -> u8 {
    (b >> 4) | (b << 4)
}

/// Quantize the first 128 buckets to 2-bit quartile labels, four labels
/// per byte, written in reverse byte order.
fn quantize(buckets: &[u64; NUM_BUCKETS], q1: u64, q2: u64, q3: u64) -> [u8; CODE_SIZE] {
    let mut code = [0u8; CODE_SIZE];
    for i in 0..CODE_SIZE {
        let mut byte = 0u8;
        for j in 0..4 {
            let k = buckets[4 * i + j];
            let label = if q3 < k {
                3
            } else if q2 < k {
                2
            } else if q1 < k {
                1
            } else {
                0
            };
            byte |= label << (2 * j);
        }
        code[CODE_SIZE - 1 - i] = byte;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_code_fixtures() {
        assert_eq!(length_code(5), 3);
        assert_eq!(length_code(100), 11);
        assert_eq!(length_code(1000), 17);
        assert_eq!(length_code(10_000), 34);
    }

    #[test]
    fn length_code_grows_with_length() {
        let mut last = 0;
        for len in [5u64, 50, 500, 656, 657, 3199, 3200, 50_000, 1_000_000] {
            let code = length_code(len);
            assert!(code >= last, "length {len} regressed to {code}");
            last = code;
        }
    }

    #[test]
    fn nibble_swap() {
        assert_eq!(swap_nibbles(0x12), 0x21);
        assert_eq!(swap_nibbles(0xF0), 0x0F);
        assert_eq!(swap_nibbles(swap_nibbles(0xA7)), 0xA7);
    }

    #[test]
    fn quantize_labels_and_order() {
        let mut buckets = [0u64; NUM_BUCKETS];
        // Bucket 0 above q3, bucket 1 above q2, bucket 2 above q1,
        // bucket 3 at q1.
        buckets[0] = 40;
        buckets[1] = 30;
        buckets[2] = 20;
        buckets[3] = 10;
        let code = quantize(&buckets, 10, 25, 35);
        // Labels 3, 2, 1, 0 packed low-to-high into the last code byte.
        assert_eq!(code[CODE_SIZE - 1], 0b00_01_10_11);
        assert!(code[..CODE_SIZE - 1].iter().all(|&b| b == 0));
    }

    #[test]
    fn hex_render_shape() {
        let digest = Tlsh::hash_from_bytes(b"proxim digest smoke test input").unwrap();
        let hex = digest.to_string();
        assert_eq!(hex.len(), 2 * DIGEST_SIZE);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn parse_inverts_render() {
        let digest = Tlsh::hash_from_bytes(b"round trip me through hex please").unwrap();
        let parsed = Tlsh::parse(&digest.to_string()).unwrap();
        assert_eq!(parsed, digest);
        assert_eq!(parsed.q_ratio(), digest.q_ratio());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            Tlsh::parse("abcd"),
            Err(ProximError::BadDigestLength { len: 2 })
        ));
        assert!(matches!(
            Tlsh::parse("xyz"),
            Err(ProximError::OddHexLength { len: 3 })
        ));
    }
}
