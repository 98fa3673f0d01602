//! End-to-end tests for the locality-sensitive digest.

use std::io::Write;

use proxim::{ProximError, Tlsh, DIGEST_SIZE};

#[test]
fn bytes_and_stream_agree() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 131 % 251) as u8).collect();
    let from_bytes = Tlsh::hash_from_bytes(&data).unwrap();
    let from_stream = Tlsh::hash_from_stream(std::io::BufReader::new(&data[..])).unwrap();
    assert_eq!(from_bytes, from_stream);
}

#[test]
fn file_digest_matches_buffer_digest() {
    let data = b"content that lives in a file for a moment".repeat(64);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let from_file = Tlsh::hash_file(file.path()).unwrap();
    let from_bytes = Tlsh::hash_from_bytes(&data).unwrap();
    assert_eq!(from_file, from_bytes);
}

#[test]
fn missing_file_surfaces_the_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Tlsh::hash_file(dir.path().join("no-such-file"));
    assert!(matches!(result, Err(ProximError::Stream(_))));
}

#[test]
fn short_input_is_rejected() {
    for len in 0..5 {
        let result = Tlsh::hash_from_bytes(&vec![0u8; len]);
        assert!(
            matches!(result, Err(ProximError::StreamTooShort)),
            "length {len} should be too short"
        );
    }
    assert!(Tlsh::hash_from_bytes(&[0u8; 5]).is_ok());
}

#[test]
fn digests_are_deterministic() {
    let data = b"determinism is the whole point of a fingerprint".to_vec();
    assert_eq!(
        Tlsh::hash_from_bytes(&data).unwrap(),
        Tlsh::hash_from_bytes(&data).unwrap()
    );
}

#[test]
fn length_classes_separate_digests() {
    // 100 and 10,000 bytes of the same repeated content fall in different
    // length buckets, so the digests must differ at least there.
    let short = Tlsh::hash_from_bytes(&vec![0xAB; 100]).unwrap();
    let long = Tlsh::hash_from_bytes(&vec![0xAB; 10_000]).unwrap();
    assert_ne!(short.length_code(), long.length_code());
    assert_ne!(short, long);
}

#[test]
fn hex_round_trip_preserves_every_field() {
    let digest = Tlsh::hash_from_bytes(b"some reasonably sized digest input").unwrap();
    let hex = digest.to_string();
    assert_eq!(hex.len(), 2 * DIGEST_SIZE);

    let parsed = Tlsh::parse(&hex).unwrap();
    assert_eq!(parsed, digest);
    assert_eq!(parsed.checksum(), digest.checksum());
    assert_eq!(parsed.length_code(), digest.length_code());
    assert_eq!(parsed.q1_ratio(), digest.q1_ratio());
    assert_eq!(parsed.q2_ratio(), digest.q2_ratio());
    assert_eq!(parsed.code(), digest.code());
    assert_eq!(parsed.binary(), digest.binary());
}

#[test]
fn parse_accepts_uppercase() {
    let digest = Tlsh::hash_from_bytes(b"case should not matter on parse").unwrap();
    let parsed = Tlsh::parse(&digest.to_string().to_uppercase()).unwrap();
    assert_eq!(parsed, digest);
}

#[cfg(feature = "serde")]
mod serde_round_trip {
    use super::*;

    #[test]
    fn digest_survives_json() {
        let digest = Tlsh::hash_from_bytes(b"serialize me to json and back").unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        let back: Tlsh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn config_survives_json() {
        let config = proxim::IndexConfig {
            hash_size: 256,
            max_distance: 35,
            use_multiindex: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: proxim::IndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
