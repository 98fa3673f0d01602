//! Pearson bucket accumulation over a byte stream.
//!
//! A 5-byte window slides over the stream one byte at a time, `chunk[0]`
//! holding the most recently read byte. Each position updates a rolling
//! checksum and increments six of 256 bucket counters, one per salt-varied
//! Pearson hash of a 3-byte subset of the window. The subsets are exactly
//! the six unordered 3-element selections of the window that include the
//! newest byte.
//!
//! The permutation table is a fixed design constant; digests are only
//! comparable between implementations that reproduce it bit for bit.

use std::io::{BufRead, ErrorKind};

use crate::{ProximError, Result};

pub(crate) const WINDOW_LENGTH: usize = 5;
pub(crate) const NUM_BUCKETS: usize = 256;

const SALTS: [u8; 6] = [2, 3, 5, 7, 11, 13];

const V_TABLE: [u8; 256] = [
    1, 87, 49, 12, 176, 178, 102, 166, 121, 193, 6, 84, 249, 230, 44, 163,
    14, 197, 213, 181, 161, 85, 218, 80, 64, 239, 24, 226, 236, 142, 38, 200,
    110, 177, 104, 103, 141, 253, 255, 50, 77, 101, 81, 18, 45, 96, 31, 222,
    25, 107, 190, 70, 86, 237, 240, 34, 72, 242, 20, 214, 244, 227, 149, 235,
    97, 234, 57, 22, 60, 250, 82, 175, 208, 5, 127, 199, 111, 62, 135, 248,
    174, 169, 211, 58, 66, 154, 106, 195, 245, 171, 17, 187, 182, 179, 0, 243,
    132, 56, 148, 75, 128, 133, 158, 100, 130, 126, 91, 13, 153, 246, 216, 219,
    119, 68, 223, 78, 83, 88, 201, 99, 122, 11, 92, 32, 136, 114, 52, 10,
    138, 30, 48, 183, 156, 35, 61, 26, 143, 74, 251, 94, 129, 162, 63, 152,
    170, 7, 115, 167, 241, 206, 3, 150, 55, 59, 151, 220, 90, 53, 23, 131,
    125, 173, 15, 238, 79, 95, 89, 16, 105, 137, 225, 224, 217, 160, 37, 123,
    118, 73, 2, 157, 46, 116, 9, 145, 134, 228, 207, 212, 202, 215, 69, 229,
    27, 188, 67, 124, 168, 252, 42, 4, 29, 108, 21, 247, 19, 205, 39, 203,
    233, 40, 186, 147, 198, 192, 155, 33, 164, 191, 98, 204, 165, 180, 117, 76,
    140, 36, 210, 172, 41, 54, 159, 8, 185, 232, 113, 196, 231, 47, 146, 120,
    51, 65, 28, 144, 254, 221, 93, 189, 194, 139, 112, 43, 71, 109, 184, 209,
];

/// Pearson hash of three key bytes under a salt: four table lookups.
#[inline]
pub(crate) fn pearson(salt: u8, k0: u8, k1: u8, k2: u8) -> u8 {
    let mut h = V_TABLE[salt as usize];
    h = V_TABLE[(h ^ k0) as usize];
    h = V_TABLE[(h ^ k1) as usize];
    V_TABLE[(h ^ k2) as usize]
}

/// Consume the stream, producing bucket counters, the rolling checksum,
/// and the total byte count.
///
/// Fails with [`ProximError::StreamTooShort`] when fewer than 5 bytes are
/// available; any non-EOF read error after the bootstrap is propagated.
pub(crate) fn fill_buckets<R: BufRead>(
    mut reader: R,
) -> Result<([u64; NUM_BUCKETS], u8, u64)> {
    let mut buckets = [0u64; NUM_BUCKETS];
    let mut chunk = [0u8; WINDOW_LENGTH];

    reader.read_exact(&mut chunk).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            ProximError::StreamTooShort
        } else {
            ProximError::Stream(e)
        }
    })?;
    // Newest byte first.
    chunk.reverse();

    let mut total = WINDOW_LENGTH as u64;
    let mut checksum = 0u8;

    loop {
        checksum = pearson(0, chunk[0], chunk[1], checksum);

        buckets[pearson(SALTS[0], chunk[0], chunk[1], chunk[2]) as usize] += 1;
        buckets[pearson(SALTS[1], chunk[0], chunk[1], chunk[3]) as usize] += 1;
        buckets[pearson(SALTS[2], chunk[0], chunk[2], chunk[3]) as usize] += 1;
        buckets[pearson(SALTS[3], chunk[0], chunk[2], chunk[4]) as usize] += 1;
        buckets[pearson(SALTS[4], chunk[0], chunk[1], chunk[4]) as usize] += 1;
        buckets[pearson(SALTS[5], chunk[0], chunk[3], chunk[4]) as usize] += 1;

        match read_byte(&mut reader)? {
            Some(byte) => {
                chunk.copy_within(0..WINDOW_LENGTH - 1, 1);
                chunk[0] = byte;
                total += 1;
            }
            None => break,
        }
    }

    Ok((buckets, checksum, total))
}

fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
