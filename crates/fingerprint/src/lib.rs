//! Content fingerprinting: a pure function from a byte stream to a
//! fixed-length, collision-resistant digest. No metadata, path, or size is
//! ever mixed into the digest — only the file's bytes.

use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};

/// Bytes are read and hashed in chunks this size, so a single large file
/// never needs to be held in memory all at once.
const CHUNK_SIZE: usize = 1024 * 1024;

/// A blake3 content digest, rendered in canonical lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub const LEN: usize = 32;

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    pub fn from_hex(hex: &str) -> Result<Self, InvalidFingerprint> {
        let hash = blake3::Hash::from_hex(hex).map_err(|_| InvalidFingerprint {
            value: hex.to_string(),
        })?;
        Ok(Fingerprint(*hash.as_bytes()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid fingerprint hex string: {value}")]
pub struct InvalidFingerprint {
    pub value: String,
}

impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Fingerprint an in-memory byte slice.
pub fn fingerprint_bytes(contents: &[u8]) -> Fingerprint {
    Fingerprint(*blake3::hash(contents).as_bytes())
}

/// Fingerprint a readable stream, chunk by chunk, so the whole file is
/// never resident in memory at once.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Fingerprint(*hasher.finalize().as_bytes()))
}

/// Fingerprint the file at `path`, streaming its contents.
pub fn fingerprint_file(path: &std::path::Path) -> io::Result<Fingerprint> {
    let file = std::fs::File::open(path)?;
    fingerprint_reader(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slice_has_well_defined_digest() {
        let fp = fingerprint_bytes(b"");
        assert_eq!(fp, fingerprint_bytes(b""));
        assert_eq!(fp.to_hex().len(), 64);
    }

    #[test]
    fn deterministic_across_calls() {
        let a = fingerprint_bytes(b"hello world");
        let b = fingerprint_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn differing_content_differs() {
        let a = fingerprint_bytes(b"hello world");
        let b = fingerprint_bytes(b"hello world!");
        assert_ne!(a, b);
    }

    #[test]
    fn reader_matches_in_memory_hash() {
        let data = vec![7u8; CHUNK_SIZE * 3 + 17];
        let from_bytes = fingerprint_bytes(&data);
        let from_reader = fingerprint_reader(io::Cursor::new(&data)).unwrap();
        assert_eq!(from_bytes, from_reader);
    }

    #[test]
    fn hex_round_trip() {
        let fp = fingerprint_bytes(b"round trip me");
        let hex = fp.to_hex();
        let parsed = Fingerprint::from_hex(&hex).unwrap();
        assert_eq!(fp, parsed);
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(Fingerprint::from_hex("not-a-hash").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let fp = fingerprint_bytes(b"serde me");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }

    #[test]
    fn fingerprint_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"on disk contents").unwrap();
        let from_disk = fingerprint_file(&path).unwrap();
        let from_mem = fingerprint_bytes(b"on disk contents");
        assert_eq!(from_disk, from_mem);
    }
}
