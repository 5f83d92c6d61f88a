//! Content hashing for convergence detection.
//!
//! A [`ContentHash`] is the hex-encoded SHA-256 digest of a byte buffer. Two
//! buffers hash equal iff they are byte-identical, which is what iterative
//! rewriting passes compare to decide whether they reached a fixed point.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of raw source bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` hex digits, for log lines.
    pub fn short(&self, n: usize) -> &str {
        let end = n.min(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            ContentHash::compute(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn identical_bytes_hash_equal() {
        let a = ContentHash::compute(b"puts 1\n");
        let b = ContentHash::compute(b"puts 1\n");
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_changes_hash() {
        let a = ContentHash::compute(b"puts 1\n");
        let b = ContentHash::compute(b"puts 1 \n");
        assert_ne!(a, b);
    }

    #[test]
    fn short_prefix() {
        let h = ContentHash::compute(b"x");
        assert_eq!(h.short(8).len(), 8);
        assert!(h.as_str().starts_with(h.short(8)));
        assert_eq!(h.short(1000), h.as_str());
    }

    #[test]
    fn serializes_as_plain_string() {
        let h = ContentHash::compute(b"");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h));
    }
}
