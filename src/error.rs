//! Error types for proxim.

use thiserror::Error;

/// Errors that can occur while parsing fingerprints, constructing an index,
/// or computing a digest.
#[derive(Debug, Error)]
pub enum ProximError {
    /// Hex input has an odd number of characters.
    #[error("hex string has odd length {len}")]
    OddHexLength { len: usize },

    /// Hex input contains a non-hex byte.
    #[error("bad hex character {byte:#04x} at offset {offset}")]
    BadHexChar { byte: u8, offset: usize },

    /// Byte-to-fingerprint conversion on a buffer that is not a whole
    /// number of 64-bit limbs.
    #[error("byte buffer length {len} is not a multiple of 8")]
    BadByteLength { len: usize },

    /// Construction-time: fingerprint width is not a multiple of 64, or the
    /// derived block width exceeds the 16-bit block value limit.
    #[error("unsupported hash size {bits} bits: {reason}")]
    BadHashSize { bits: usize, reason: &'static str },

    /// Construction-time: `max_distance + 1` blocks exceed the 255 limit.
    #[error("max distance {max_distance} requires {blocks} blocks, over the 255 limit")]
    TooManyBlocks { max_distance: usize, blocks: usize },

    /// Digest parse on input that is not exactly 35 bytes.
    #[error("digest is {len} bytes, expected 35")]
    BadDigestLength { len: usize },

    /// The digest stream ended before the 5-byte bootstrap window.
    #[error("stream shorter than the 5-byte digest window")]
    StreamTooShort,

    /// A non-EOF read error from the digest stream.
    #[error("digest stream read failed")]
    Stream(#[from] std::io::Error),
}

/// Result type alias for proxim operations.
pub type Result<T> = std::result::Result<T, ProximError>;
