//! Digest acquisition for text inputs.
//!
//! The pattern engine only ever consumes `u32` words; how those words are
//! produced is pluggable through [`DigestSource`].

use crate::error::Result;
use sha2::{Digest, Sha256};

/// Ordered digest words plus the raw bytes they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDigest {
    words: Vec<u32>,
    bytes: Vec<u8>,
}

impl HashDigest {
    /// Builds a digest from precomputed words.
    pub fn from_words(words: &[u32]) -> Self {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self {
            words: words.to_vec(),
            bytes,
        }
    }

    /// Groups raw digest bytes into little-endian words. Trailing bytes that
    /// do not fill a whole word are kept in `bytes` but produce no word.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self {
            words,
            bytes: bytes.to_vec(),
        }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Space-separated lowercase hex bytes, for diagnostics.
    pub fn to_hex_string(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Produces the digest for a text input.
pub trait DigestSource: Send + Sync {
    fn digest(&self, input: &str) -> Result<HashDigest>;
}

/// SHA-256 over the UTF-8 bytes of the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Source;

impl DigestSource for Sha256Source {
    fn digest(&self, input: &str) -> Result<HashDigest> {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        Ok(HashDigest::from_bytes(&hasher.finalize()))
    }
}
